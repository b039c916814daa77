use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use beanwire_endpoint::{ConnectionHandler, HandlerConfig, ServerContext, StaticContext, Worker};
use beanwire_transport::{LineConnection, TcpEndpoint};
use tracing::{debug, info, warn};

use crate::cmd::{parse_duration, ServeArgs};
use crate::demo;
use crate::exit::{io_error, transport_error, CliError, CliResult, INTERNAL, SUCCESS};

/// The thread serving one connection.
#[derive(Debug)]
struct ConnectionWorker {
    id: usize,
    recycled: AtomicBool,
}

impl Worker for ConnectionWorker {
    fn shutdown(&self) {
        self.recycled.store(true, Ordering::SeqCst);
        debug!(worker = self.id, "worker recycled after connection failure");
    }
}

pub fn run(args: ServeArgs) -> CliResult<i32> {
    let config = HandlerConfig {
        max_frame_size: args.max_frame_size,
        read_timeout: Some(parse_duration(&args.read_timeout)?),
        write_timeout: Some(parse_duration(&args.write_timeout)?),
    };
    let endpoint = TcpEndpoint::bind(&args.addr).map_err(|err| transport_error("bind failed", err))?;
    let local_addr = endpoint.local_addr();
    let context: Arc<dyn ServerContext> = Arc::new(StaticContext::new(demo::registry()));

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone(), local_addr)?;

    println!("listening on {local_addr}");

    let mut workers: Vec<JoinHandle<()>> = Vec::new();
    let mut served = 0usize;

    while running.load(Ordering::SeqCst) {
        let conn = match endpoint.accept() {
            Ok(conn) => conn,
            Err(err) if !running.load(Ordering::SeqCst) => {
                debug!(error = %err, "accept failed during shutdown");
                break;
            }
            Err(err) => return Err(transport_error("accept failed", err)),
        };
        if !running.load(Ordering::SeqCst) {
            break;
        }

        served += 1;
        let worker = Arc::new(ConnectionWorker {
            id: served,
            recycled: AtomicBool::new(false),
        });
        let context = Arc::clone(&context);
        let config = config.clone();
        let handle = thread::Builder::new()
            .name(format!("conn-{served}"))
            .spawn(move || serve_connection(conn, context, config, worker))
            .map_err(|err| io_error("spawning connection thread failed", err))?;
        workers.push(handle);
        workers.retain(|handle| !handle.is_finished());

        if args.count.is_some_and(|count| served >= count) {
            break;
        }
    }

    for handle in workers {
        if handle.join().is_err() {
            warn!("connection thread panicked");
        }
    }
    info!(served, "server stopped");
    Ok(SUCCESS)
}

fn serve_connection(
    conn: LineConnection,
    context: Arc<dyn ServerContext>,
    config: HandlerConfig,
    worker: Arc<ConnectionWorker>,
) {
    let peer = conn.peer().to_string();
    let mut handler = ConnectionHandler::new();
    handler.init(context, config);

    match handler.handle(conn, worker.clone()) {
        Ok(response) => debug!(%peer, error = response.is_error(), "connection served"),
        Err(err) => warn!(%peer, error = %err, "connection aborted"),
    }
    if worker.recycled.load(Ordering::SeqCst) {
        debug!(worker = worker.id, %peer, "connection thread exiting after shutdown");
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>, local_addr: SocketAddr) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        // Wake the blocking accept so the loop sees the flag.
        let _ = TcpStream::connect_timeout(&local_addr, Duration::from_millis(200));
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
