use crate::ServiceIdentity;
use camino::Utf8Path;

/// Fills the `{name}`, `{description}` and `{path}` placeholders of a service definition.
///
/// Substituted values are never themselves scanned for placeholders.
/// Any other brace, as used by shell functions, is kept as is.
pub(crate) fn render(template: &str, identity: &ServiceIdentity, executable: &Utf8Path) -> String {
    let fields = [
        ("{name}", identity.name()),
        ("{description}", identity.description()),
        ("{path}", executable.as_str()),
    ];

    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        rendered.push_str(&rest[..start]);
        rest = &rest[start..];

        match fields.iter().find(|(key, _)| rest.starts_with(key)) {
            Some((key, value)) => {
                rendered.push_str(value);
                rest = &rest[key.len()..];
            }
            None => {
                rendered.push('{');
                rest = &rest[1..];
            }
        }
    }
    rendered.push_str(rest);
    rendered
}
