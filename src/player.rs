//! Implements `VirtualPlayer` -- a computer-controlled side that
//! chooses moves on a background thread.
//!
//! The player shares the live board with its host behind a mutex, but
//! holds the lock only twice per search: once to copy the position at
//! search start, once to verify at search end that the live board has
//! not changed in the meantime. The search itself runs against the
//! private copy, so the host thread is never blocked while the player
//! thinks.
//!
//! The lifecycle is command-driven: `start_thinking` posts a request
//! to the thinking thread, `stop_thinking` trips the cooperative
//! cancellation flag, and a report (the chosen move or the reason
//! there is none) comes back through a channel, with a condition
//! variable to block on when the host has nothing better to do.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::board::ChessBoard;
use crate::depth::Depth;
use crate::errors::SearchError;
use crate::moves::Move;
use crate::search::{select_move, Evaluator};


enum Command {
    Think,
    Exit,
}

/// What a finished (or abandoned) search reports back.
pub type ThinkReport = Result<Move, SearchError>;


/// A chess player that selects moves by searching on its own thread.
pub struct VirtualPlayer {
    commands: Sender<Command>,
    reports: Receiver<ThinkReport>,
    has_report: Arc<(Mutex<bool>, Condvar)>,
    abort: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl VirtualPlayer {
    /// Creates a player thinking `depth` plies ahead on the given
    /// shared board, and spawns its thinking thread.
    pub fn new<E>(board: Arc<Mutex<ChessBoard>>, depth: Depth, evaluator: E) -> VirtualPlayer
        where E: Evaluator + 'static
    {
        let (commands_tx, commands_rx) = channel();
        let (reports_tx, reports_rx) = channel();
        let has_report = Arc::new((Mutex::new(false), Condvar::new()));
        let abort = Arc::new(AtomicBool::new(false));
        let handle = {
            let has_report = Arc::clone(&has_report);
            let abort = Arc::clone(&abort);
            thread::spawn(move || {
                run_thinking_loop(board,
                                  depth,
                                  evaluator,
                                  commands_rx,
                                  reports_tx,
                                  has_report,
                                  abort);
            })
        };
        VirtualPlayer {
            commands: commands_tx,
            reports: reports_rx,
            has_report,
            abort,
            handle: Some(handle),
        }
    }

    /// Asks the player to choose a move for the board's current
    /// position. Returns immediately; the answer arrives as a report.
    pub fn start_thinking(&self) {
        self.abort.store(false, Ordering::Relaxed);
        self.commands
            .send(Command::Think)
            .expect("the thinking thread has exited");
    }

    /// Trips the cancellation flag of the search in flight, if any.
    /// The search reports `Interrupted` once it observes the flag.
    pub fn stop_thinking(&self) {
        self.abort.store(true, Ordering::Relaxed);
    }

    /// Blocks until a report is available.
    pub fn wait_report(&self) {
        let (lock, condvar) = &*self.has_report;
        let mut available = lock.lock().unwrap();
        while !*available {
            available = condvar.wait(available).unwrap();
        }
    }

    /// Picks up a pending report without blocking.
    pub fn try_recv_report(&self) -> Option<ThinkReport> {
        match self.reports.try_recv() {
            Ok(report) => {
                let (lock, _) = &*self.has_report;
                *lock.lock().unwrap() = false;
                Some(report)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                panic!("the thinking thread has exited");
            }
        }
    }

    /// Blocks until the next report arrives and returns it.
    pub fn recv_report(&self) -> ThinkReport {
        loop {
            self.wait_report();
            if let Some(report) = self.try_recv_report() {
                return report;
            }
        }
    }
}

impl Drop for VirtualPlayer {
    fn drop(&mut self) {
        self.stop_thinking();
        let _ = self.commands.send(Command::Exit);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}


fn run_thinking_loop<E: Evaluator>(board: Arc<Mutex<ChessBoard>>,
                                   depth: Depth,
                                   evaluator: E,
                                   commands: Receiver<Command>,
                                   reports: Sender<ThinkReport>,
                                   has_report: Arc<(Mutex<bool>, Condvar)>,
                                   abort: Arc<AtomicBool>) {
    let mut rng = StdRng::from_entropy();
    while let Ok(command) = commands.recv() {
        match command {
            Command::Exit => break,
            Command::Think => {
                // Snapshot under the lock, search outside it.
                let (copy, version) = {
                    let live = board.lock().unwrap();
                    (live.clone(), live.version())
                };
                info!("thinking started: {:?} to move, version {}",
                      copy.to_move(),
                      version);
                let report = select_move(&copy, depth, &evaluator, &abort, &mut rng)
                    .and_then(|chosen| {
                        // A move for a position that no longer exists
                        // must never reach the host.
                        let live = board.lock().unwrap();
                        if live.version() == version {
                            Ok(chosen)
                        } else {
                            Err(SearchError::PositionChanged)
                        }
                    });
                match &report {
                    Ok(chosen) => debug!("thinking done: {}", chosen),
                    Err(reason) => debug!("thinking ended without a move: {}", reason),
                }
                if reports.send(report).is_err() {
                    break;
                }
                let (lock, condvar) = &*has_report;
                *lock.lock().unwrap() = true;
                condvar.notify_all();
            }
        }
    }
}
