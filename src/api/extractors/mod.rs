//! Custom extractors mapping rejections onto `AppError`.

mod entity_id;
mod validated_json;
mod validated_query;

pub use entity_id::EntityId;
pub use validated_json::ValidatedJson;
pub use validated_query::ValidatedQuery;

/// Format validation errors into a user-friendly string
pub(crate) fn format_validation_errors(errors: &validator::ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field))
            })
        })
        .collect();
    // field_errors is a HashMap; keep output stable
    messages.sort();
    messages.join(", ")
}
