//! Tests for command execution over a scripted exec channel

mod common;

use common::{ScriptedConnection, scripted_events};
use futures::executor::block_on;
use shell_connect::{Error, ExecEvent, ExecNotification, ExecOptions, Session, StreamKind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn session_with_events(script: Vec<ExecEvent>) -> Session {
    Session::new(
        "example.com",
        22,
        Some("deploy".to_string()),
        Box::new(ScriptedConnection {
            events: Some(scripted_events(script)),
            transfer: None,
        }),
    )
}

fn data(kind: StreamKind, bytes: &[u8]) -> ExecEvent {
    ExecEvent::Data {
        kind,
        bytes: bytes.to_vec(),
    }
}

#[test]
fn buffers_demultiplexed_output() {
    block_on(async {
        let mut session = session_with_events(vec![
            data(StreamKind::Stdout, b"he"),
            data(StreamKind::Stdout, b"llo"),
            ExecEvent::Exit {
                code: Some(0),
                signal: None,
            },
            ExecEvent::Close,
        ]);

        let output = session
            .exec("echo hello", ExecOptions::default())
            .await
            .wait()
            .await
            .unwrap();

        assert_eq!(output.stdout, "hello");
        assert_eq!(output.stderr, "");
        assert_eq!(output.exit_code, Some(0));
        assert!(output.success());
    });
}

// Regression: channels may deliver data after the exit notification; the
// result must not be composed until close.
#[test]
fn data_after_exit_lands_in_final_output() {
    block_on(async {
        let mut session = session_with_events(vec![
            data(StreamKind::Stdout, b"first"),
            ExecEvent::Exit {
                code: Some(0),
                signal: None,
            },
            data(StreamKind::Stdout, b" second"),
            ExecEvent::Close,
        ]);

        let output = session
            .exec("slow-tail", ExecOptions::default())
            .await
            .wait()
            .await
            .unwrap();

        assert_eq!(output.stdout, "first second");
    });
}

// Regression for the failure path: data delivered between exit and close
// must still reach the captured buffers.
#[test]
fn failure_captures_output_arriving_after_exit() {
    block_on(async {
        let mut session = session_with_events(vec![
            data(StreamKind::Stdout, b"par"),
            ExecEvent::Exit {
                code: Some(1),
                signal: None,
            },
            data(StreamKind::Stdout, b"tial"),
            data(StreamKind::Stderr, b"boom\n"),
            ExecEvent::Close,
        ]);

        let err = session
            .exec("false", ExecOptions::default())
            .await
            .wait()
            .await
            .unwrap_err();

        match err {
            Error::CommandFailed {
                code,
                signal,
                message,
                stdout,
            } => {
                assert_eq!(code, 1);
                assert_eq!(signal, None);
                assert_eq!(message, "boom");
                assert_eq!(stdout, "partial");
            }
            other => panic!("unexpected error: {other}"),
        }
    });
}

#[test]
fn close_without_exit_still_finalizes() {
    block_on(async {
        let mut session = session_with_events(vec![
            data(StreamKind::Stdout, b"partial"),
            ExecEvent::Close,
        ]);

        let output = session
            .exec("interrupted", ExecOptions::default())
            .await
            .wait()
            .await
            .unwrap();

        assert_eq!(output.stdout, "partial");
        assert_eq!(output.exit_code, None);
        assert!(output.success());
    });
}

#[test]
fn duplicate_close_finalizes_exactly_once() {
    block_on(async {
        let mut session = session_with_events(vec![
            ExecEvent::Exit {
                code: Some(0),
                signal: None,
            },
            ExecEvent::Close,
            ExecEvent::Close,
        ]);

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();

        let exec = session
            .exec("true", ExecOptions::default())
            .await
            .on_complete(move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
            });

        let output = exec.wait().await.unwrap();
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn setup_error_is_terminal() {
    block_on(async {
        let mut session = Session::new(
            "example.com",
            22,
            None,
            Box::new(ScriptedConnection {
                events: None,
                transfer: None,
            }),
        );

        let observed = Arc::new(Mutex::new(None));
        let sink = observed.clone();
        let exec = session
            .exec("anything", ExecOptions::default())
            .await
            .on_complete(move |outcome| {
                *sink.lock().unwrap() = Some(outcome.is_err());
            });

        let err = exec.wait().await.unwrap_err();
        assert!(matches!(err, Error::ChannelSetup { .. }));
        assert_eq!(*observed.lock().unwrap(), Some(true));
    });
}

#[test]
fn callback_and_future_observe_same_outcome() {
    block_on(async {
        let mut session = session_with_events(vec![
            data(StreamKind::Stdout, b"payload"),
            ExecEvent::Exit {
                code: Some(0),
                signal: None,
            },
            ExecEvent::Close,
        ]);

        let from_callback = Arc::new(Mutex::new(String::new()));
        let sink = from_callback.clone();
        let exec = session
            .exec("cat payload", ExecOptions::default())
            .await
            .on_complete(move |outcome| {
                *sink.lock().unwrap() = outcome.as_ref().unwrap().stdout.clone();
            });

        let output = exec.wait().await.unwrap();
        assert_eq!(*from_callback.lock().unwrap(), output.stdout);
    });
}

#[test]
fn emits_exit_then_close_with_same_payload() {
    block_on(async {
        let mut session = session_with_events(vec![
            ExecEvent::Exit {
                code: Some(1),
                signal: Some("SIGTERM".to_string()),
            },
            ExecEvent::Close,
        ]);

        let notifications = Arc::new(Mutex::new(Vec::new()));
        let sink = notifications.clone();
        let exec = session
            .exec("term-me", ExecOptions::default())
            .await
            .on_notification(move |notification| {
                sink.lock().unwrap().push(notification);
            });

        let _ = exec.wait().await;

        let seen = notifications.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                ExecNotification::Exit {
                    code: Some(1),
                    signal: Some("SIGTERM".to_string()),
                },
                ExecNotification::Close {
                    code: Some(1),
                    signal: Some("SIGTERM".to_string()),
                },
            ]
        );
    });
}

// Events delivered asynchronously while the operation is awaited, the way
// a real transport feeds its channel.
#[test]
fn late_events_arrive_while_awaiting() {
    common::init_tracing();
    smol::block_on(async {
        let (tx, rx) = async_channel::unbounded();
        let mut session = Session::new(
            "example.com",
            22,
            None,
            Box::new(ScriptedConnection {
                events: Some(rx),
                transfer: None,
            }),
        );
        let exec = session.exec("streaming", ExecOptions::default()).await;

        let feeder = smol::spawn(async move {
            tx.send(data(StreamKind::Stdout, b"first")).await.unwrap();
            smol::Timer::after(Duration::from_millis(10)).await;
            tx.send(ExecEvent::Exit {
                code: Some(0),
                signal: None,
            })
            .await
            .unwrap();
            smol::Timer::after(Duration::from_millis(10)).await;
            tx.send(data(StreamKind::Stdout, b" second")).await.unwrap();
            tx.send(ExecEvent::Close).await.unwrap();
        });

        let output = exec.await.unwrap();
        feeder.await;
        assert_eq!(output.stdout, "first second");
    });
}
