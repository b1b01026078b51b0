//! VCM command construction

use crate::error::{IngestError, Result};

/// Fields requested from the project listing
pub const MEMBER_FIELDS: [&str; 4] = ["memberarchive", "name", "memberrev", "cpid"];

/// A single command option, either `--key=value` or a bare `--key` flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOption {
    pub key: String,
    pub value: Option<String>,
}

impl CommandOption {
    fn render(&self) -> String {
        match &self.value {
            Some(value) => format!("--{}={}", self.key, value),
            None => format!("--{}", self.key),
        }
    }
}

/// A command sent to the VCM service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Application namespace, e.g. `si`
    pub app: String,
    /// Command within the application, e.g. `viewproject`
    pub name: String,
    /// Options in the order they were added
    pub options: Vec<CommandOption>,
}

impl Command {
    pub fn new(app: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            app: app.into(),
            name: name.into(),
            options: Vec::new(),
        }
    }

    /// Append a `--key=value` option
    pub fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.push(CommandOption {
            key: key.into(),
            value: Some(value.into()),
        });
        self
    }

    /// Append a bare `--key` flag
    pub fn flag(mut self, key: impl Into<String>) -> Self {
        self.options.push(CommandOption {
            key: key.into(),
            value: None,
        });
        self
    }

    /// Value of the first option named `key`
    pub fn get(&self, key: &str) -> Option<&CommandOption> {
        self.options.iter().find(|o| o.key == key)
    }

    /// Check that the command can be sent
    pub fn validate(&self) -> Result<()> {
        if self.app.trim().is_empty() || self.name.trim().is_empty() {
            return Err(IngestError::query(
                self.complete_command(),
                "application and command name must be set",
            ));
        }
        if let Some(option) = self.options.iter().find(|o| o.key.trim().is_empty()) {
            return Err(IngestError::query(
                self.complete_command(),
                format!("option with empty key (value {:?})", option.value),
            ));
        }
        Ok(())
    }

    /// Arguments following the application name: the command name, then options
    pub fn args(&self) -> Vec<String> {
        std::iter::once(self.name.clone())
            .chain(self.options.iter().map(CommandOption::render))
            .collect()
    }

    /// The full command line, for diagnostics
    pub fn complete_command(&self) -> String {
        std::iter::once(self.app.clone())
            .chain(self.args())
            .map(|arg| {
                if arg.chars().any(char::is_whitespace) {
                    format!("\"{arg}\"")
                } else {
                    arg
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.complete_command())
    }
}

/// The recursive, attribute-filtered project listing for one revision
#[derive(Debug, Clone)]
pub struct ViewProjectQuery {
    pub project_path: String,
    pub attribute_filters: Vec<String>,
    pub revision: String,
}

impl ViewProjectQuery {
    pub fn new(
        project_path: impl Into<String>,
        attribute_filters: Vec<String>,
        revision: impl Into<String>,
    ) -> Self {
        Self {
            project_path: project_path.into(),
            attribute_filters,
            revision: revision.into(),
        }
    }

    /// `attribute:A,attribute:B,...`
    pub fn filter_expression(&self) -> String {
        self.attribute_filters
            .iter()
            .map(|tag| format!("attribute:{tag}"))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Build and validate the `si viewproject` command
    pub fn command(&self) -> Result<Command> {
        let mut command = Command::new("si", "viewproject")
            .option("project", self.project_path.as_str())
            .flag("filterSubs");
        if !self.attribute_filters.is_empty() {
            command = command.option("filter", self.filter_expression());
        }
        let command = command
            .option("fields", MEMBER_FIELDS.join(","))
            .option("projectRevision", self.revision.as_str())
            .flag("recurse");

        if self.project_path.trim().is_empty() {
            return Err(IngestError::query(
                command.complete_command(),
                "project path is empty",
            ));
        }
        if self.revision.trim().is_empty() {
            return Err(IngestError::query(
                command.complete_command(),
                "revision label is empty",
            ));
        }
        command.validate()?;

        Ok(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn query() -> ViewProjectQuery {
        ViewProjectQuery::new(
            "/Projects/Demo/project.pj",
            vec!["Build_DJ".to_string(), "Build_Boot".to_string()],
            "R1",
        )
    }

    #[test]
    fn test_view_project_options_in_order() {
        let command = query().command().unwrap();
        let keys: Vec<_> = command.options.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(
            keys,
            ["project", "filterSubs", "filter", "fields", "projectRevision", "recurse"]
        );
        assert_eq!(
            command.get("filter").unwrap().value.as_deref(),
            Some("attribute:Build_DJ,attribute:Build_Boot")
        );
        assert_eq!(
            command.get("fields").unwrap().value.as_deref(),
            Some("memberarchive,name,memberrev,cpid")
        );
        assert!(command.get("recurse").unwrap().value.is_none());
    }

    #[test]
    fn test_complete_command_quotes_whitespace() {
        let command = Command::new("si", "viewproject")
            .option("project", "/Projects/Software Development/project.pj")
            .flag("recurse");
        assert_eq!(
            command.complete_command(),
            "si viewproject \"--project=/Projects/Software Development/project.pj\" --recurse"
        );
    }

    #[test]
    fn test_empty_revision_is_query_error() {
        let mut q = query();
        q.revision = String::new();
        assert_eq!(q.command().unwrap_err().kind(), ErrorKind::Query);
    }

    #[test]
    fn test_empty_option_key_is_query_error() {
        let command = Command::new("si", "viewproject").flag("");
        assert_eq!(command.validate().unwrap_err().kind(), ErrorKind::Query);
    }

    #[test]
    fn test_no_filters_omits_filter_option() {
        let mut q = query();
        q.attribute_filters.clear();
        let command = q.command().unwrap();
        assert!(command.get("filter").is_none());
    }
}
