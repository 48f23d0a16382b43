//! Error reporting helpers
//!
//! Errors that know whether their message is meant for the person running
//! the program implement [`ContextualError`]; [`log_error_with_context`] then
//! picks the right amount of detail for the fatal log line.

/// Errors that distinguish user-actionable failures from system failures
///
/// When `is_user_actionable()` returns `true`, `user_message()` must return
/// `Some(message)`; otherwise it returns `None`.
pub trait ContextualError: std::error::Error {
    /// True for failures the user can fix, such as a bad listener
    /// declaration or an unreadable settings file
    fn is_user_actionable(&self) -> bool;

    /// The message to show for user-actionable errors
    fn user_message(&self) -> Option<&str>;
}

/// Log a fatal error with the detail level its kind calls for
///
/// User-actionable errors log their own message; anything else logs the
/// operation context. Full detail always goes to the debug level.
///
/// # Examples
/// ```rust,no_run
/// use rabbit_listeners::core::error_handling::log_error_with_context;
/// use rabbit_listeners::listener::ListenerError;
///
/// let err = ListenerError::Resolution {
///     reference: "#{@missing}".to_string(),
///     reason: "no object named 'missing'".to_string(),
/// };
/// log_error_with_context(&err, "Listener registration");
/// // Logs: "FATAL: no object named 'missing'"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
