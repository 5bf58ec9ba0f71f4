//! All errors that can occur when resolving immunity configurations.
//!
//! Every variant is fatal at the point of resolution: a misconfigured
//! strain, vaccine, decay form or efficacy axis must stop simulation setup
//! before any simulated day runs.

use std::fmt;

use crate::core::waning::FORM_CHOICES;

#[derive(Clone, Debug, PartialEq)]
pub enum ImmunityError {
    /// A strain or vaccine specification was neither a preset name nor a
    /// parameter mapping.
    InvalidSpec(String),
    /// A preset name did not match any known strain or vaccine.
    UnknownPreset {
        kind: &'static str,
        name: String,
        choices: Vec<&'static str>,
    },
    /// A decay form tag did not match any implemented waning function.
    UnknownDecayForm(String),
    /// An efficacy axis outside of `sus`, `symp` and `sev`.
    InvalidAxis(String),
}

impl fmt::Display for ImmunityError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImmunityError::InvalidSpec(message) => {
                write!(f, "InvalidSpec: {}", message)
            }
            ImmunityError::UnknownPreset {
                kind,
                name,
                choices,
            } => {
                write!(
                    f,
                    "the selected {} \"{}\" is not implemented; choices are:\n{}",
                    kind,
                    name,
                    choices.join("\n")
                )
            }
            ImmunityError::UnknownDecayForm(form) => {
                write!(
                    f,
                    "the selected functional form \"{}\" is not implemented; choices are: {}",
                    form,
                    FORM_CHOICES.join(", ")
                )
            }
            ImmunityError::InvalidAxis(axis) => {
                write!(
                    f,
                    "choice \"{}\" not in list of choices: sus, symp, sev",
                    axis
                )
            }
        }
    }
}

impl std::error::Error for ImmunityError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_preset_enumerates_choices() {
        let error = ImmunityError::UnknownPreset {
            kind: "variant",
            name: "b118".to_string(),
            choices: vec!["wild", "b117"],
        };
        let message = error.to_string();
        assert!(message.contains("b118"));
        assert!(message.contains("wild"));
        assert!(message.contains("b117"));
    }

    #[test]
    fn unknown_decay_form_enumerates_forms() {
        let message = ImmunityError::UnknownDecayForm("quadratic".to_string()).to_string();
        for form in FORM_CHOICES {
            assert!(message.contains(form));
        }
    }
}
