/// Template written by `affilink --init`.
pub fn generate_init_template() -> String {
	r#"# affilink configuration
#
# Configs are discovered from the current directory upward. Rules from nearer
# files come first, and the first rule whose domain occurs in a link's host
# wins. Set `root = true` to stop the walk here (~/.affilink.toml still applies
# unless AFFILINK_NO_USER_CONFIG is set).
root = true

# Replace existing affiliate parameters? When false, links that already carry
# one of a rule's keys are left untouched.
overwrite = false

# Add rel="nofollow" to rewritten links.
add-nofollow = false

# Only consider the first N links of each text.
# max-links = 500

# One rule per line: <domain>=<param_key>=<param_value>
domains = """
amazon.com=tag=mytag-20
example.com=ref=yourid
"""
"#
	.to_string()
}
