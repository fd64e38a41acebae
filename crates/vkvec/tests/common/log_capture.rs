use std::cell::RefCell;

use log::{Level, LevelFilter, Metadata, Record};

thread_local! {
    static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Forwards to `env_logger` and keeps the warnings and errors of each thread.
struct CaptureLogger {
    inner: env_logger::Logger,
}

impl log::Log for CaptureLogger {
    fn enabled(
        &self,
        metadata: &Metadata,
    ) -> bool {
        metadata.level() <= Level::Warn || self.inner.enabled(metadata)
    }

    fn log(
        &self,
        record: &Record,
    ) {
        if self.inner.enabled(record.metadata()) {
            self.inner.log(record);
        }
        if record.level() <= Level::Warn {
            WARNINGS.with(|warnings| warnings.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

pub fn install() {
    let inner = env_logger::Builder::from_default_env().is_test(true).build();
    let max_level = inner.filter().max(LevelFilter::Warn);
    let logger: &'static CaptureLogger = Box::leak(Box::new(CaptureLogger {
        inner,
    }));
    if log::set_logger(logger).is_ok() {
        log::set_max_level(max_level);
    }
}

/// Drains the warnings logged on the current thread.
pub fn take_warnings() -> Vec<String> {
    WARNINGS.with(|warnings| std::mem::take(&mut *warnings.borrow_mut()))
}
