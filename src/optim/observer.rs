use argmin::core::{observers::Observe, Error, State, KV};

/// Observer forwarding solver progress to the `log` facade
///
/// Initialization is logged at `info` level, every iteration at `debug` level
/// with the current and best cost.
pub struct LogObserver {
    /// Prefix identifying the solver in log records
    pub solver: &'static str,
}

impl LogObserver {
    pub fn new(solver: &'static str) -> Self {
        Self { solver }
    }
}

impl<I> Observe<I> for LogObserver
where
    I: State,
{
    fn observe_init(&mut self, msg: &str, state: &I, _kv: &KV) -> Result<(), Error> {
        log::info!(
            "{} ({}): starting at cost {}",
            self.solver,
            msg,
            state.get_cost()
        );
        Ok(())
    }

    fn observe_iter(&mut self, state: &I, _kv: &KV) -> Result<(), Error> {
        log::debug!(
            "{} iter {}: cost = {}, best cost = {}",
            self.solver,
            state.get_iter(),
            state.get_cost(),
            state.get_best_cost()
        );
        Ok(())
    }
}
