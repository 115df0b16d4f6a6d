use crate::context::Context;
use anyhow::Result;
use std::net::{TcpStream, ToSocketAddrs};
use std::thread;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Handles the 'tcpwait' command - blocks until a TCP port accepts connections
pub struct TcpWaitCommand;

impl TcpWaitCommand {
    /// Retry forever until `address` accepts a connection
    pub fn execute(ctx: &Context, address: &str) -> Result<()> {
        loop {
            ctx.output
                .info(&format!("Waiting for TCP connection on {}", address));

            if Self::try_connect(address) {
                ctx.output.success(&format!("{} is accepting connections", address));
                return Ok(());
            }

            thread::sleep(RETRY_INTERVAL);
        }
    }

    /// One attempt against every address `address` resolves to.
    /// Resolution failures count as a failed attempt.
    fn try_connect(address: &str) -> bool {
        let Ok(candidates) = address.to_socket_addrs() else {
            return false;
        };

        candidates
            .into_iter()
            .any(|addr| TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).is_ok())
    }
}
