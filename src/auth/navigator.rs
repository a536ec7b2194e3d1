/// Sends the user back to the login screen once their session is gone.
pub trait Navigator: Send + Sync {
    fn navigate_to_login(&self);
}

impl std::fmt::Debug for dyn Navigator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Navigator").finish()
    }
}

impl<F> Navigator for F
where
    F: Fn() + Send + Sync,
{
    fn navigate_to_login(&self) {
        self()
    }
}

/// Terminal navigator: tells the user how to sign in again.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoginPrompt;

impl LoginPrompt {
    pub const MESSAGE: &'static str = "Session expired. Run: inkpad auth login";
}

impl Navigator for LoginPrompt {
    fn navigate_to_login(&self) {
        tracing::warn!("Session ended, login required");
        eprintln!("{}", Self::MESSAGE);
    }
}
