use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building or spooling a call file.
///
/// Each variant corresponds to one stage of the pipeline, so a caller can
/// tell validation problems (fix the input and resubmit, nothing touched
/// disk) from delivery problems (a temp file exists and is deliberately
/// left in place for diagnosis).
#[derive(Debug, Error)]
pub enum CallFileError {
    /// The call target has no channel, nothing can be dialed.
    #[error("call target has an empty channel")]
    MissingChannel,

    /// The action is incomplete: an application with no name, or a
    /// dialplan location missing one of context/extension/priority.
    #[error("no complete action defined for this call")]
    NoActionDefined,

    /// Creating or writing the temporary call file failed.
    #[error("failed to write temporary call file: {source}")]
    WriteTemp {
        #[source]
        source: io::Error,
    },

    /// The spool user could not be resolved in the user database.
    #[error("unknown spool user: {user}")]
    UnknownUser { user: String },

    /// The filesystem rejected handing the call file over to the spool
    /// user.
    #[error("failed to chown call file to {user}: {source}")]
    SetOwner {
        user: String,
        #[source]
        source: nix::Error,
    },

    /// Moving the finished call file into the spool directory failed. The
    /// temporary file is left where it was written.
    #[error("failed to move call file into {dest}: {source}")]
    Spool {
        dest: PathBuf,
        #[source]
        source: io::Error,
    },
}
