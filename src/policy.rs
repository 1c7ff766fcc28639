/// Administrator-controlled rewrite behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Policy {
	/// Replace an existing query key that collides with a rule key. When
	/// false, a collision leaves the whole link untouched.
	pub overwrite: bool,

	/// Make sure rewritten anchors carry `rel="nofollow"`.
	pub add_nofollow: bool,

	/// Only the first `max_links` anchors of a text are considered.
	pub max_links: Option<usize>,
}

impl Policy {
	pub fn with_overwrite(mut self, overwrite: bool) -> Self {
		self.overwrite = overwrite;
		self
	}

	pub fn with_nofollow(mut self, add_nofollow: bool) -> Self {
		self.add_nofollow = add_nofollow;
		self
	}

	pub fn with_max_links(mut self, max_links: Option<usize>) -> Self {
		self.max_links = max_links;
		self
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_default_policy_does_not_overwrite() {
		let policy = Policy::default();
		assert!(!policy.overwrite);
		assert!(!policy.add_nofollow);
		assert!(policy.max_links.is_none());
	}

	#[test]
	fn test_builder_methods() {
		let policy = Policy::default()
			.with_overwrite(true)
			.with_nofollow(true)
			.with_max_links(Some(5));
		assert_eq!(
			policy,
			Policy {
				overwrite: true,
				add_nofollow: true,
				max_links: Some(5),
			}
		);
	}
}
