use validator::ValidationErrors;

/// Joins every field-level validation message into a single `; `-separated line.
///
/// Nested struct and list errors (e.g. a malformed question inside a quiz) are
/// flattened too, so a handler can report them in one response message.
pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut messages = Vec::new();
    collect_messages(errors, &mut messages);
    messages.join("; ")
}

fn collect_messages(errors: &ValidationErrors, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for kind in errors.errors().values() {
        match kind {
            ValidationErrorsKind::Field(errs) => {
                out.extend(
                    errs.iter()
                        .filter_map(|e| e.message.as_ref().map(|m| m.to_string())),
                );
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, out),
            ValidationErrorsKind::List(items) => {
                for inner in items.values() {
                    collect_messages(inner, out);
                }
            }
        }
    }
}
