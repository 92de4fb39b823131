/// Destination for the (non-fatal) problems found during verification
pub trait WarningSink {
    fn warn(&mut self, message: &str);
}

/// Emit warnings through the `log` facade, at the `warn` level
#[derive(Default, Debug)]
pub struct LogWarnings;

impl WarningSink for LogWarnings {
    fn warn(&mut self, message: &str) {
        log::warn!("{}", message);
    }
}

/// Collect warnings in memory
impl WarningSink for Vec<String> {
    fn warn(&mut self, message: &str) {
        self.push(message.to_owned());
    }
}

impl<S: WarningSink + ?Sized> WarningSink for &mut S {
    fn warn(&mut self, message: &str) {
        (**self).warn(message)
    }
}
