//! Character-reference handling and attribute edits for anchor tags.

use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// A character reference at the start of the haystack.
static ENTITY_AT: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^&(?:#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{0,31});")
		.expect("entity pattern is valid")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z][a-zA-Z0-9]{0,31});")
		.expect("entity pattern is valid")
});

/// One attribute of a tag: a name with an optional double-quoted,
/// single-quoted or bare (possibly empty) value.
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"([^\s"'=<>/]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]*)))?"#)
		.expect("attribute pattern is valid")
});

/// Decode the character references an href value may carry in markup.
///
/// Numeric references and the five markup-significant named references are
/// decoded. Unknown names are kept as written.
pub fn decode_entities(input: &str) -> Cow<'_, str> {
	if !input.contains('&') {
		return Cow::Borrowed(input);
	}

	ENTITY.replace_all(input, |caps: &Captures<'_>| {
		let body = &caps[1];
		let decoded = if let Some(num) = body.strip_prefix('#') {
			let code = match num.strip_prefix(['x', 'X']) {
				Some(hex) => u32::from_str_radix(hex, 16).ok(),
				None => num.parse::<u32>().ok(),
			};
			code.and_then(char::from_u32)
		} else {
			match body.to_ascii_lowercase().as_str() {
				"amp" => Some('&'),
				"lt" => Some('<'),
				"gt" => Some('>'),
				"quot" => Some('"'),
				"apos" => Some('\''),
				_ => None,
			}
		};

		match decoded {
			Some(c) => c.to_string(),
			None => caps[0].to_string(),
		}
	})
}

/// Escape a decoded value for use inside a double-quoted attribute.
pub fn escape_attr(input: &str) -> Cow<'_, str> {
	escape_with(input, false)
}

/// Escape element content.
///
/// An `&` that already starts a character reference is left alone so
/// content that was escaped once is not escaped twice.
pub fn escape_text(input: &str) -> Cow<'_, str> {
	escape_with(input, true)
}

fn escape_with(input: &str, keep_entities: bool) -> Cow<'_, str> {
	if !input.contains(['&', '<', '>', '"', '\'']) {
		return Cow::Borrowed(input);
	}

	let mut out = String::with_capacity(input.len() + 16);
	for (i, c) in input.char_indices() {
		match c {
			'&' if keep_entities && ENTITY_AT.is_match(&input[i..]) => out.push('&'),
			'&' => out.push_str("&amp;"),
			'<' => out.push_str("&lt;"),
			'>' => out.push_str("&gt;"),
			'"' => out.push_str("&quot;"),
			'\'' => out.push_str("&#39;"),
			_ => out.push(c),
		}
	}
	Cow::Owned(out)
}

/// Ensure the anchor's `rel` attribute carries the `nofollow` token.
///
/// `before` and `after` are the attribute runs on either side of `href`.
/// An existing `rel` keeps its tokens and gains `nofollow` at the end; with no
/// `rel` at all, `rel="nofollow"` is appended after the other attributes and
/// ahead of a self-closing `/`. Text inside other attribute values is never
/// taken for a `rel` attribute.
pub fn ensure_nofollow<'a>(before: &'a str, after: &'a str) -> (Cow<'a, str>, Cow<'a, str>) {
	if let Some(edited) = add_nofollow_token(before) {
		return (edited, Cow::Borrowed(after));
	}
	if let Some(edited) = add_nofollow_token(after) {
		return (Cow::Borrowed(before), edited);
	}
	(Cow::Borrowed(before), Cow::Owned(append_rel(after)))
}

fn append_rel(after: &str) -> String {
	let body = after.trim_end();
	let tail = &after[body.len()..];
	// A `/` glued to a bare value belongs to that value.
	let self_closing = |head: &str| {
		head.is_empty() || head.ends_with(|c: char| c.is_whitespace() || c == '"' || c == '\'')
	};
	match body.strip_suffix('/') {
		Some(head) if self_closing(head) => {
			format!("{} rel=\"nofollow\" /{tail}", head.trim_end())
		}
		_ => format!("{after} rel=\"nofollow\""),
	}
}

/// Edit the first `rel` attribute in `attrs`. `None` when there is none.
fn add_nofollow_token(attrs: &str) -> Option<Cow<'_, str>> {
	let caps = ATTRIBUTE
		.captures_iter(attrs)
		.find(|caps| caps[1].eq_ignore_ascii_case("rel"))?;

	let (at, tokens, quoted) = match (caps.get(2), caps.get(3), caps.get(4)) {
		(Some(v), _, _) | (_, Some(v), _) => (v.range(), v.as_str(), true),
		(_, _, Some(v)) => (v.range(), v.as_str(), false),
		// `rel` with no value at all.
		_ => {
			let end = caps.get(1)?.end();
			(end..end, "", false)
		}
	};

	if tokens
		.split_ascii_whitespace()
		.any(|t| t.eq_ignore_ascii_case("nofollow"))
	{
		return Some(Cow::Borrowed(attrs));
	}

	let merged = match tokens.trim_end() {
		"" => "nofollow".to_string(),
		kept => format!("{kept} nofollow"),
	};

	let replacement = if quoted {
		merged
	} else if at.is_empty() && caps.get(4).is_none() {
		format!("=\"{merged}\"")
	} else {
		format!("\"{merged}\"")
	};

	let mut out = String::with_capacity(attrs.len() + 12);
	out.push_str(&attrs[..at.start]);
	out.push_str(&replacement);
	out.push_str(&attrs[at.end..]);
	Some(Cow::Owned(out))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_decode_entities() {
		assert_eq!(decode_entities("a=1&amp;b=2"), "a=1&b=2");
		assert_eq!(decode_entities("&lt;&gt;&quot;&#39;&#x41;&AMP;"), "<>\"'A&");
		assert_eq!(decode_entities("&copy; stays"), "&copy; stays");
		assert_eq!(decode_entities("a=1&b=2"), "a=1&b=2");
	}

	#[test]
	fn test_decode_invalid_code_point_kept() {
		assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
	}

	#[test]
	fn test_escape_text_markup() {
		assert_eq!(
			escape_text("<script>alert(\"x\")</script>"),
			"&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
		);
		assert_eq!(escape_text("it's"), "it&#39;s");
		assert_eq!(escape_text("plain"), "plain");
	}

	#[test]
	fn test_escape_text_does_not_double_encode() {
		assert_eq!(escape_text("a=1&amp;b=2&c=3"), "a=1&amp;b=2&amp;c=3");
		assert_eq!(escape_text("&lt;b&gt;"), "&lt;b&gt;");
		assert_eq!(escape_text("&#39;"), "&#39;");
	}

	#[test]
	fn test_escape_text_is_idempotent() {
		let once = escape_text("Tom & Jerry <b>\"x\"</b>").into_owned();
		assert_eq!(escape_text(&once), once);
	}

	#[test]
	fn test_escape_attr_encodes_every_ampersand() {
		assert_eq!(escape_attr("/a&lt;b?x=1&y=2"), "/a&amp;lt;b?x=1&amp;y=2");
		assert_eq!(decode_entities(&escape_attr("/a&lt;b")), "/a&lt;b");
	}

	#[test]
	fn test_nofollow_merges_existing_rel() {
		let (before, after) = ensure_nofollow(" ", r#" rel="external""#);
		assert_eq!(before, " ");
		assert_eq!(after, r#" rel="external nofollow""#);
	}

	#[test]
	fn test_nofollow_in_before_attrs() {
		let (before, after) = ensure_nofollow(r#" class="x" REL='noopener' "#, "");
		assert_eq!(before, r#" class="x" REL='noopener nofollow' "#);
		assert_eq!(after, "");
	}

	#[test]
	fn test_nofollow_already_present() {
		let (before, after) = ensure_nofollow(" ", r#" rel="NoFollow external""#);
		assert_eq!(after, r#" rel="NoFollow external""#);
		assert_eq!(before, " ");
	}

	#[test]
	fn test_nofollow_added_when_missing() {
		let (_, after) = ensure_nofollow(" ", r#" target="_blank""#);
		assert_eq!(after, r#" target="_blank" rel="nofollow""#);
	}

	#[test]
	fn test_nofollow_bare_and_empty_values() {
		let (_, after) = ensure_nofollow(" ", " rel=external");
		assert_eq!(after, r#" rel="external nofollow""#);

		let (_, after) = ensure_nofollow(" ", r#" rel="""#);
		assert_eq!(after, r#" rel="nofollow""#);
	}

	#[test]
	fn test_nofollow_ignores_data_rel() {
		let (_, after) = ensure_nofollow(" ", r#" data-rel="x""#);
		assert_eq!(after, r#" data-rel="x" rel="nofollow""#);
	}

	#[test]
	fn test_nofollow_skips_rel_text_inside_other_values() {
		let (before, after) = ensure_nofollow(r#" title="see rel=x" "#, "");
		assert_eq!(before, r#" title="see rel=x" "#);
		assert_eq!(after, r#" rel="nofollow""#);

		let (before, after) = ensure_nofollow(" ", r#" data-note='a rel="y"' rel=b"#);
		assert_eq!(before, " ");
		assert_eq!(after, r#" data-note='a rel="y"' rel="b nofollow""#);
	}

	#[test]
	fn test_nofollow_empty_bare_rel_is_filled_in_place() {
		let (_, once) = ensure_nofollow(" ", " rel=");
		assert_eq!(once, r#" rel="nofollow""#);

		let (_, twice) = ensure_nofollow(" ", &once);
		assert_eq!(twice, once);
	}

	#[test]
	fn test_nofollow_valueless_rel() {
		let (_, after) = ensure_nofollow(" ", " rel target=_blank");
		assert_eq!(after, r#" rel="nofollow" target=_blank"#);
	}

	#[test]
	fn test_nofollow_before_self_closing_slash() {
		let (_, after) = ensure_nofollow(" ", "/");
		assert_eq!(after, r#" rel="nofollow" /"#);

		let (_, after) = ensure_nofollow(" ", r#" target="_blank" / "#);
		assert_eq!(after, r#" target="_blank" rel="nofollow" / "#);

		let (_, after) = ensure_nofollow(" ", " data-x=a/");
		assert_eq!(after, r#" data-x=a/ rel="nofollow""#);
	}
}
