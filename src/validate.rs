use crate::types::{Line, Script, ValidationReport};

/// Check that every jump and option target names an existing node.
/// Collects every violation instead of stopping at the first one.
pub fn validate(script: &Script) -> ValidationReport {
    let mut errors = Vec::new();

    for node in script.nodes() {
        if let Some(target) = &node.jump {
            if !script.contains(target) {
                errors.push(format!(
                    "node \"{}\" jumps to missing node \"{}\"",
                    node.id, target
                ));
            }
        }

        for line in &node.lines {
            let Line::Choice { options, .. } = line else {
                continue;
            };
            for option in options {
                let Some(target) = &option.target else {
                    continue;
                };
                if !script.contains(target) {
                    errors.push(format!(
                        "node \"{}\" has a choice option targeting missing node \"{}\"",
                        node.id, target
                    ));
                }
            }
        }
    }

    ValidationReport::from_errors(errors)
}
