/// Events emitted while a workflow runs. Front ends decide how to render them.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    /// One outer solver iteration has finished.
    Iteration {
        index: usize,
        objective: f64,
        max_violation: f64,
    },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    /// Runs `body` between a `PhaseStart` and a `PhaseFinish` event.
    ///
    /// `PhaseFinish` is only reported when `body` succeeds, so a failed phase leaves the
    /// front end showing where it stopped.
    pub fn phase<T, E>(
        &self,
        name: &'static str,
        body: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, E> {
        self.report(Progress::PhaseStart { name });
        let result = body()?;
        self.report(Progress::PhaseFinish);
        Ok(result)
    }
}
