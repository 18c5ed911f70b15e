// Shape of the dispatcher's log file lines, produced by a real dispatch.
#![cfg(unix)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use seisops::logging::log_file_subscriber;
use seisops_core::{CommandConfig, DispatchConfig};
use seisops_dispatch::{Dispatcher, SubRunStatus, TriggerRequest};

#[derive(Clone, Default)]
struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn dispatch_lines_are_timestamp_then_message() {
    let buf = Buffer::default();
    let sink = buf.clone();
    let _guard = tracing::subscriber::set_default(log_file_subscriber(move || sink.clone()));

    let tmp = tempfile::tempdir().unwrap();
    let config = DispatchConfig {
        pacing_secs: 0,
        marker_dir: tmp.path().join("flags").to_string_lossy().into_owned(),
        resolver: CommandConfig {
            program: "echo".into(),
            args: vec!["<preferredOriginID>abc123</preferredOriginID>".into()],
        },
        generator: CommandConfig {
            program: "true".into(),
            args: Vec::new(),
        },
        ..DispatchConfig::default()
    };
    let dispatcher = Arc::new(Dispatcher::from_config(&config));
    let report = dispatcher.dispatch(TriggerRequest::new("EVT1", vec![0])).await;
    assert_eq!(report.count(SubRunStatus::Succeeded), 1);

    let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
    assert!(!text.contains("dispatch{"), "{text}");
    assert!(!text.contains("INFO"), "{text}");

    // continuation lines of multi-line tool output carry no timestamp
    let messages: Vec<&str> = text
        .lines()
        .filter(|l| l.starts_with('['))
        .map(|line| {
            assert_eq!(&line[11..12], " ", "{line}");
            assert_eq!(&line[20..22], "] ", "{line}");
            &line[22..]
        })
        .collect();

    for expected in [
        "Using worker pool with max_workers=2",
        "Scheduled thread for delay 0s",
        "Event EVT1_0 is being processed.",
        "Running ShakeMap for origin abc123, event_id EVT1_0",
        "Thread for delay 0s has completed.",
        "All ShakeMap runs have completed.",
    ] {
        assert!(messages.contains(&expected), "missing {expected:?} in {messages:#?}");
    }
}
