pub mod arq;
pub mod channel;
pub mod config;
pub mod frame;
pub mod simulation;
pub mod sweep;
pub mod topology;
pub mod util;


#[cfg(test)]
mod test {
    use tracing::Level;

    #[ctor::ctor]
    fn init_test_logging() {
        tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(Level::DEBUG)
            .try_init()
            .ok();
    }
}
