use crate::action::Action;
use crate::call::CallTarget;
use crate::config::DEFAULT_SPOOL_DIR;
use crate::error::CallFileError;
use crate::spool::{self, DeliverOptions};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// One outgoing call, ready to be rendered and spooled.
///
/// Borrows its [`CallTarget`] and [`Action`]; both must outlive the call
/// file. Everything else (variables, archive flag, spool user, paths) is
/// set through the `with_*` methods before [`render`](Self::render) or
/// [`spool`](Self::spool) is called.
///
/// Field values must not contain newlines; the renderer does not escape
/// them. The directive format is line-oriented and an embedded newline
/// would change the meaning of the file.
#[derive(Debug, Clone)]
pub struct CallFile<'a> {
    call: &'a CallTarget,
    action: &'a Action,
    set_var: IndexMap<String, String>,
    archive: bool,
    user: Option<String>,
    tmpdir: Option<PathBuf>,
    file_name: Option<String>,
    spool_dir: PathBuf,
}

impl<'a> CallFile<'a> {
    pub fn new(call: &'a CallTarget, action: &'a Action) -> Self {
        Self {
            call,
            action,
            set_var: IndexMap::new(),
            archive: false,
            user: None,
            tmpdir: None,
            file_name: None,
            spool_dir: PathBuf::from(DEFAULT_SPOOL_DIR),
        }
    }

    /// Set one channel variable for the answered call. Variables render in
    /// the order they were added; setting a name twice overwrites its
    /// value in place.
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_var.insert(name.into(), value.into());
        self
    }

    pub fn with_variables(mut self, vars: IndexMap<String, String>) -> Self {
        self.set_var = vars;
        self
    }

    /// Ask Asterisk to keep a copy of the call file after processing it.
    pub fn with_archive(mut self, archive: bool) -> Self {
        self.archive = archive;
        self
    }

    /// Hand the spooled file over to this system user before publishing.
    /// Asterisk refuses call files it cannot read, so this is usually the
    /// user the daemon runs as.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Directory for the intermediate temporary file. Keep it on the same
    /// filesystem as the spool directory so the final move stays atomic.
    pub fn with_tmpdir(mut self, tmpdir: impl Into<PathBuf>) -> Self {
        self.tmpdir = Some(tmpdir.into());
        self
    }

    /// Base name to publish under, replacing the generated temp name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn with_spool_dir(mut self, spool_dir: impl Into<PathBuf>) -> Self {
        self.spool_dir = spool_dir.into();
        self
    }

    pub fn spool_dir(&self) -> &Path {
        &self.spool_dir
    }

    /// Render the ordered directive lines for this call.
    ///
    /// The channel is checked first, then the action; the optional
    /// directives follow in a fixed order so identical input always
    /// renders identical output.
    pub fn render(&self) -> Result<Vec<String>, CallFileError> {
        if self.call.channel.is_empty() {
            return Err(CallFileError::MissingChannel);
        }

        let mut lines = Vec::new();
        lines.push(format!("Channel: {}", self.call.channel));
        lines.extend(self.action.lines()?);

        for (name, value) in &self.set_var {
            lines.push(format!("Set: {}={}", name, value));
        }

        if let Some(ref callerid) = self.call.callerid {
            lines.push(format!("Callerid: {}", callerid));
        }
        if let Some(seconds) = self.call.wait_time {
            lines.push(format!("WaitTime: {}", seconds));
        }
        if let Some(retries) = self.call.max_retries {
            lines.push(format!("Maxretries: {}", retries));
        }
        if let Some(seconds) = self.call.retry_time {
            lines.push(format!("RetryTime: {}", seconds));
        }
        if let Some(ref account) = self.call.account {
            lines.push(format!("Account: {}", account));
        }
        if self.archive {
            lines.push("Archive: yes".to_string());
        }

        Ok(lines)
    }

    /// The full call file as one string, directives joined with `\n`.
    pub fn contents(&self) -> Result<String, CallFileError> {
        Ok(self.render()?.join("\n"))
    }

    /// Render this call and publish it into the spool directory.
    ///
    /// With a `schedule`, the file's modification time is set to that
    /// moment and Asterisk will not place the call before it; without one
    /// the call is placed as soon as the daemon sees the file.
    pub fn spool(&self, schedule: Option<DateTime<Local>>) -> Result<(), CallFileError> {
        let lines = self.render()?;
        spool::deliver(
            &lines,
            &DeliverOptions {
                tmpdir: self.tmpdir.as_deref(),
                user: self.user.as_deref(),
                schedule,
                spool_dir: &self.spool_dir,
                file_name: self.file_name.as_deref(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playback() -> Action {
        Action::application_with_data("Playback", "hello-world")
    }

    #[test]
    fn test_application_lines_follow_channel() {
        let call = CallTarget::new("SIP/1234");
        let action = playback();
        let lines = CallFile::new(&call, &action).render().unwrap();

        assert_eq!(
            lines,
            vec![
                "Channel: SIP/1234".to_string(),
                "Application: Playback".to_string(),
                "Data: hello-world".to_string(),
            ]
        );
        assert!(!lines.iter().any(|l| l.starts_with("Context:")));
    }

    #[test]
    fn test_application_without_data_omits_data_line() {
        let call = CallTarget::new("SIP/1234");
        let action = Action::application("Hangup");
        let lines = CallFile::new(&call, &action).render().unwrap();

        assert_eq!(lines, vec!["Channel: SIP/1234", "Application: Hangup"]);
    }

    #[test]
    fn test_context_lines_in_order() {
        let call = CallTarget::new("DAHDI/g1/5551234567");
        let action = Action::context("outbound", "s", 1);
        let lines = CallFile::new(&call, &action).render().unwrap();

        assert_eq!(
            lines,
            vec![
                "Channel: DAHDI/g1/5551234567",
                "Context: outbound",
                "Extension: s",
                "Priority: 1",
            ]
        );
        assert!(!lines.iter().any(|l| l.starts_with("Application:")));
    }

    #[test]
    fn test_render_is_deterministic() {
        let call = CallTarget::new("SIP/1234")
            .with_callerid("\"Door\" <100>")
            .with_wait_time(30)
            .with_max_retries(2)
            .with_retry_time(60)
            .with_account("billing");
        let action = playback();
        let cf = CallFile::new(&call, &action)
            .with_variable("FOO", "1")
            .with_archive(true);

        assert_eq!(cf.render().unwrap(), cf.render().unwrap());
    }

    #[test]
    fn test_optional_directives_render_in_fixed_order() {
        let call = CallTarget::new("SIP/1234")
            .with_callerid("100")
            .with_wait_time(30)
            .with_max_retries(2)
            .with_retry_time(60)
            .with_account("billing");
        let action = playback();
        let lines = CallFile::new(&call, &action)
            .with_archive(true)
            .render()
            .unwrap();

        assert_eq!(
            lines[3..],
            [
                "Callerid: 100".to_string(),
                "WaitTime: 30".to_string(),
                "Maxretries: 2".to_string(),
                "RetryTime: 60".to_string(),
                "Account: billing".to_string(),
                "Archive: yes".to_string(),
            ]
        );
    }

    #[test]
    fn test_empty_channel_fails_before_action_validation() {
        let call = CallTarget::new("");
        let action = Action::application(""); // also invalid
        let err = CallFile::new(&call, &action).render().unwrap_err();

        assert!(matches!(err, CallFileError::MissingChannel));
    }

    #[test]
    fn test_incomplete_application_action_is_rejected() {
        let call = CallTarget::new("SIP/1234");
        let action = Action::application("");
        let err = CallFile::new(&call, &action).render().unwrap_err();

        assert!(matches!(err, CallFileError::NoActionDefined));
    }

    #[test]
    fn test_incomplete_context_action_is_rejected() {
        let call = CallTarget::new("SIP/1234");
        for action in [
            Action::context("", "s", 1),
            Action::context("outbound", "", 1),
            Action::context("outbound", "s", ""),
        ] {
            let err = CallFile::new(&call, &action).render().unwrap_err();
            assert!(matches!(err, CallFileError::NoActionDefined));
        }
    }

    #[test]
    fn test_variables_render_in_insertion_order() {
        let call = CallTarget::new("SIP/1234");
        let action = playback();
        let lines = CallFile::new(&call, &action)
            .with_variable("FOO", "1")
            .with_variable("BAR", "2")
            .render()
            .unwrap();

        let set_lines: Vec<&str> = lines
            .iter()
            .filter(|l| l.starts_with("Set:"))
            .map(|l| l.as_str())
            .collect();
        assert_eq!(set_lines, ["Set: FOO=1", "Set: BAR=2"]);
    }

    #[test]
    fn test_no_variables_no_set_lines() {
        let call = CallTarget::new("SIP/1234");
        let action = playback();
        let lines = CallFile::new(&call, &action).render().unwrap();

        assert!(!lines.iter().any(|l| l.starts_with("Set:")));
    }

    #[test]
    fn test_archive_flag_renders_once() {
        let call = CallTarget::new("SIP/1234");
        let action = playback();

        let archived = CallFile::new(&call, &action)
            .with_archive(true)
            .render()
            .unwrap();
        assert_eq!(
            archived.iter().filter(|l| *l == "Archive: yes").count(),
            1
        );

        let plain = CallFile::new(&call, &action).render().unwrap();
        assert!(!plain.iter().any(|l| l.starts_with("Archive:")));
    }

    #[test]
    fn test_contents_joins_lines() {
        let call = CallTarget::new("SIP/1234");
        let action = playback();
        let contents = CallFile::new(&call, &action).contents().unwrap();

        assert_eq!(
            contents,
            "Channel: SIP/1234\nApplication: Playback\nData: hello-world"
        );
    }
}
