use regex::{NoExpand, Regex};
use std::collections::BTreeMap;

/// Errors produced while preparing a stack definition for deployment.
#[derive(Debug, thiserror::Error)]
pub enum TemplateError {
    /// A `{{` placeholder opener without a matching `}}`.
    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },

    /// The image reference could not be turned into a search pattern.
    #[error("invalid image pattern for '{prefix}': {message}")]
    ImagePattern { prefix: String, message: String },
}

/// Substitute `{{ name }}` placeholders in a stack definition template.
///
/// An empty variable map returns the template unchanged, without inspecting
/// it. Unknown variables render as the empty string, so a definition can
/// carry placeholders that only some deployments fill in.
pub fn render(template: &str, vars: &BTreeMap<String, String>) -> Result<String, TemplateError> {
    if vars.is_empty() {
        return Ok(template.to_string());
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut consumed = 0;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after.find("}}").ok_or(TemplateError::Unterminated {
            offset: consumed + start,
        })?;
        let key = after[..end].trim();
        if let Some(value) = vars.get(key) {
            out.push_str(value);
        }
        rest = &after[end + 2..];
        consumed += start + 2 + end + 2;
    }
    out.push_str(rest);
    Ok(out)
}

/// Rewrite the image reference inside a rendered stack definition.
///
/// The repository prefix is everything before the first `:` of `image` (the
/// whole reference when there is no tag). The first occurrence of that prefix,
/// with an optional tag, immediately before a line break is replaced by
/// `image`. When nothing matches the definition is returned unchanged and a
/// warning is logged, since the deployed stack would keep its old image.
pub fn substitute_image(definition: &str, image: &str) -> Result<String, TemplateError> {
    if image.is_empty() {
        return Ok(definition.to_string());
    }

    let prefix = image.split_once(':').map_or(image, |(repo, _)| repo);
    let pattern = format!("{}(:[^\n]*)?\n", regex::escape(prefix));
    let re = Regex::new(&pattern).map_err(|e| TemplateError::ImagePattern {
        prefix: prefix.to_string(),
        message: e.to_string(),
    })?;

    if !re.is_match(definition) {
        log::warn!(
            "no image reference matching '{}' in the stack definition, leaving it unchanged",
            prefix
        );
        return Ok(definition.to_string());
    }

    let replacement = format!("{}\n", image);
    Ok(re
        .replace(definition, NoExpand(&replacement))
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_substitutes_placeholders() {
        let out = render(
            "image: app:{{ tag }}\ndomain: {{domain}}\n",
            &vars(&[("tag", "1.2.0"), ("domain", "acme.io")]),
        )
        .unwrap();
        assert_eq!(out, "image: app:1.2.0\ndomain: acme.io\n");
    }

    #[test]
    fn test_render_empty_vars_returns_input_unchanged() {
        let template = "image: app:{{ tag }}\n";
        let out = render(template, &BTreeMap::new()).unwrap();
        assert_eq!(out, template);

        // Even a malformed template passes through when there is nothing to do
        let out = render("broken {{ here", &BTreeMap::new()).unwrap();
        assert_eq!(out, "broken {{ here");
    }

    #[test]
    fn test_render_unknown_variable_renders_empty() {
        let out = render("a={{ missing }}b", &vars(&[("other", "x")])).unwrap();
        assert_eq!(out, "a=b");
    }

    #[test]
    fn test_render_unterminated_placeholder_fails() {
        let err = render("ok {{ tag", &vars(&[("tag", "1")])).unwrap_err();
        match err {
            TemplateError::Unterminated { offset } => assert_eq!(offset, 3),
            TemplateError::ImagePattern { .. } => panic!("wrong error variant"),
        }
    }

    #[test]
    fn test_substitute_image_replaces_tag() {
        let out = substitute_image("image: myrepo/app:1.0\n", "myrepo/app:2.0").unwrap();
        assert_eq!(out, "image: myrepo/app:2.0\n");
    }

    #[test]
    fn test_substitute_image_empty_reference_is_identity() {
        let definition = "image: myrepo/app:1.0\n";
        let out = substitute_image(definition, "").unwrap();
        assert_eq!(out, definition);
    }

    #[test]
    fn test_substitute_image_no_match_is_identity() {
        let definition = "image: other/app:1.0\n";
        let out = substitute_image(definition, "myrepo/app:2.0").unwrap();
        assert_eq!(out, definition);
    }

    #[test]
    fn test_substitute_image_tagless_occurrence() {
        let out = substitute_image("image: myrepo/app\n", "myrepo/app:2.0").unwrap();
        assert_eq!(out, "image: myrepo/app:2.0\n");
    }

    #[test]
    fn test_substitute_image_only_first_occurrence() {
        let definition = "image: myrepo/app:1.0\nimage: myrepo/app:1.0\n";
        let out = substitute_image(definition, "myrepo/app:2.0").unwrap();
        assert_eq!(out, "image: myrepo/app:2.0\nimage: myrepo/app:1.0\n");
    }

    #[test]
    fn test_substitute_image_reference_without_tag() {
        // No colon in the new reference: the whole string is the prefix
        let out = substitute_image("image: myrepo/app:1.0\n", "myrepo/app").unwrap();
        assert_eq!(out, "image: myrepo/app\n");
    }

    #[test]
    fn test_substitute_image_prefix_is_regex_escaped() {
        let out = substitute_image("image: my.repo/app:1.0\n", "my.repo/app:2.0").unwrap();
        assert_eq!(out, "image: my.repo/app:2.0\n");
        // A '.' in the prefix must not match arbitrary characters
        let out = substitute_image("image: myxrepo/app:1.0\n", "my.repo/app:2.0").unwrap();
        assert_eq!(out, "image: myxrepo/app:1.0\n");
    }
}
