use url::form_urlencoded;

/// Ordered query-string map.
///
/// Keys keep the position of their first occurrence; a repeated key replaces
/// the earlier value (last write wins).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryMap {
	pairs: Vec<(String, String)>,
}

impl QueryMap {
	/// Decode a form-encoded query string. Empty segments are dropped.
	pub fn parse(query: &str) -> Self {
		let mut map = QueryMap::default();
		for (key, value) in form_urlencoded::parse(query.as_bytes()) {
			if key.is_empty() {
				continue;
			}
			map.insert(key.into_owned(), value.into_owned());
		}
		map
	}

	/// Insert or replace a key, keeping its original position.
	pub fn insert(&mut self, key: String, value: String) {
		match self.pairs.iter_mut().find(|(k, _)| *k == key) {
			Some(slot) => slot.1 = value,
			None => self.pairs.push((key, value)),
		}
	}

	pub fn remove(&mut self, key: &str) {
		self.pairs.retain(|(k, _)| k != key);
	}

	pub fn contains_key(&self, key: &str) -> bool {
		self.pairs.iter().any(|(k, _)| k == key)
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.pairs
			.iter()
			.find(|(k, _)| k == key)
			.map(|(_, v)| v.as_str())
	}

	pub fn keys(&self) -> impl Iterator<Item = &str> {
		self.pairs.iter().map(|(k, _)| k.as_str())
	}

	/// True if any key of `other` is present here, regardless of value.
	pub fn collides_with(&self, other: &QueryMap) -> bool {
		other.keys().any(|key| self.contains_key(key))
	}

	/// Merge `other` into `self`. Colliding keys take `other`'s value.
	pub fn merge(&mut self, other: &QueryMap) {
		for (key, value) in &other.pairs {
			self.insert(key.clone(), value.clone());
		}
	}

	pub fn is_empty(&self) -> bool {
		self.pairs.is_empty()
	}

	pub fn len(&self) -> usize {
		self.pairs.len()
	}

	/// Form-encode the pairs in order.
	pub fn encode(&self) -> String {
		form_urlencoded::Serializer::new(String::new())
			.extend_pairs(self.pairs.iter())
			.finish()
	}
}
