use crate::error::CallFileError;
use serde::{Deserialize, Deserializer, Serialize};

/// What Asterisk should do once the callee answers.
///
/// Exactly one of the two shapes exists per call: run a dialplan
/// application directly, or jump to a dialplan location. In call-spec TOML
/// the variant is selected with `type = "application"` or
/// `type = "context"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Application {
        name: String,
        #[serde(default)]
        data: Option<String>,
    },
    Context {
        context: String,
        extension: String,
        #[serde(deserialize_with = "de_priority")]
        priority: String,
    },
}

/// Dialplan priorities are written as numbers more often than not; accept
/// both a TOML integer and a string (named priorities like `hangup`).
fn de_priority<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Priority {
        Number(i64),
        Label(String),
    }

    Ok(match Priority::deserialize(deserializer)? {
        Priority::Number(n) => n.to_string(),
        Priority::Label(s) => s,
    })
}

impl Action {
    /// Run an application that takes no arguments.
    pub fn application(name: impl Into<String>) -> Self {
        Action::Application {
            name: name.into(),
            data: None,
        }
    }

    /// Run an application with an argument string. Multiple arguments use
    /// the application's own delimiter syntax; the string is passed
    /// through verbatim.
    pub fn application_with_data(name: impl Into<String>, data: impl Into<String>) -> Self {
        Action::Application {
            name: name.into(),
            data: Some(data.into()),
        }
    }

    /// Jump to a dialplan location. Priority may be a number or a named
    /// priority, it is rendered as a string either way.
    pub fn context(
        context: impl Into<String>,
        extension: impl Into<String>,
        priority: impl ToString,
    ) -> Self {
        Action::Context {
            context: context.into(),
            extension: extension.into(),
            priority: priority.to_string(),
        }
    }

    /// Render this action's directive lines.
    ///
    /// An application with an empty name, or a dialplan location with any
    /// empty part, is an incomplete action.
    pub(crate) fn lines(&self) -> Result<Vec<String>, CallFileError> {
        match self {
            Action::Application { name, data } => {
                if name.is_empty() {
                    return Err(CallFileError::NoActionDefined);
                }
                let mut out = vec![format!("Application: {}", name)];
                if let Some(data) = data {
                    out.push(format!("Data: {}", data));
                }
                Ok(out)
            }
            Action::Context {
                context,
                extension,
                priority,
            } => {
                if context.is_empty() || extension.is_empty() || priority.is_empty() {
                    return Err(CallFileError::NoActionDefined);
                }
                Ok(vec![
                    format!("Context: {}", context),
                    format!("Extension: {}", extension),
                    format!("Priority: {}", priority),
                ])
            }
        }
    }
}
