use std::thread;
use std::time::Duration;

use super::*;
use crate::mx::MxResolver;
use crate::mx::tests::StubResolver;
use crate::pipeline::tests::{RecordingProbe, accepted, rejected, routing_stub};
use crate::pipeline::{Rejection, Status};
use crate::validator::ValidationMode;

fn pipeline(probe: RecordingProbe) -> VerificationPipeline<StubResolver, RecordingProbe> {
    VerificationPipeline::new(
        ValidationMode::Strict,
        MxResolver::new(routing_stub()),
        probe,
    )
}

/// Accepts `good.com` addresses except those starting with `nobody`; earlier
/// addresses take longer so workers finish out of order.
fn uneven_probe() -> RecordingProbe {
    RecordingProbe::new(|address, hosts| {
        let delay = address.local().len() as u64 % 4;
        thread::sleep(Duration::from_millis(5 * (4 - delay)));
        if address.local().starts_with("nobody") {
            rejected(&hosts.primary().exchange)
        } else {
            accepted(&hosts.primary().exchange)
        }
    })
}

#[test]
fn preserves_input_order() {
    let pipeline = pipeline(uneven_probe());
    let addresses: Vec<String> = (0..24)
        .map(|n| match n % 3 {
            0 => format!("user{n}@good.com"),
            1 => format!("nobody{n}@good.com"),
            _ => format!("broken{n}"),
        })
        .collect();

    let job = BatchRunner::new(&pipeline, BatchOptions::default()).run(&addresses, |_| {});

    assert_eq!(job.len(), addresses.len());
    assert_eq!(job.completed, addresses.len());
    for (n, (entry, input)) in job.entries.iter().zip(&addresses).enumerate() {
        assert_eq!(&entry.input, input);
        let expected = if n % 3 == 0 {
            Status::Valid
        } else {
            Status::Invalid
        };
        assert_eq!(entry.status, expected, "{input}");
    }
}

#[test]
fn progress_is_monotonic_and_ends_at_one() {
    let pipeline = pipeline(uneven_probe());
    let addresses: Vec<String> = (0..10).map(|n| format!("user{n}@good.com")).collect();

    let mut progress = Vec::new();
    BatchRunner::new(&pipeline, BatchOptions::default())
        .run(&addresses, |fraction| progress.push(fraction));

    assert_eq!(progress.len(), addresses.len());
    assert!(progress.windows(2).all(|pair| pair[0] < pair[1]), "{progress:?}");
    assert_eq!(progress.last().copied(), Some(1.0));
}

#[test]
fn csv_scenario_statuses() {
    let pipeline = pipeline(RecordingProbe::accepting());
    let addresses = ["a@good.com", "bad-syntax", "c@no-mx.com"];

    let job = BatchRunner::new(&pipeline, BatchOptions::default()).run(&addresses, |_| {});

    assert_eq!(
        job.statuses().collect::<Vec<_>>(),
        vec![Status::Valid, Status::Invalid, Status::Invalid]
    );
    assert_eq!(pipeline.prober().calls(), 1);
}

#[test]
fn panicking_address_is_invalid_and_batch_continues() {
    let pipeline = pipeline(RecordingProbe::new(|address, hosts| {
        if address.local() == "boom" {
            panic!("probe exploded");
        }
        accepted(&hosts.primary().exchange)
    }));
    let addresses = ["a@good.com", "boom@good.com", "c@good.com"];

    let mut calls = 0;
    let job = BatchRunner::new(&pipeline, BatchOptions::default())
        .run(&addresses, |_| calls += 1);

    assert_eq!(calls, 3);
    assert_eq!(
        job.statuses().collect::<Vec<_>>(),
        vec![Status::Valid, Status::Invalid, Status::Valid]
    );
    match &job.entries[1].rejection {
        Some(Rejection::Internal { message }) => assert_eq!(message, "probe exploded"),
        other => panic!("unexpected rejection: {other:?}"),
    }
}

#[test]
fn empty_input_makes_empty_job() {
    let pipeline = pipeline(RecordingProbe::accepting());
    let addresses: Vec<String> = Vec::new();

    let mut calls = 0;
    let job = BatchRunner::new(&pipeline, BatchOptions::default())
        .run(&addresses, |_| calls += 1);

    assert!(job.is_empty());
    assert_eq!(calls, 0);
    assert!(job.all_valid());
}

#[test]
fn single_worker_runs_in_order() {
    let pipeline = pipeline(RecordingProbe::accepting());
    let addresses = ["x@good.com", "y@example.com", "z@good.com"];

    let job = BatchRunner::new(&pipeline, BatchOptions::sequential()).run(&addresses, |_| {});

    assert!(job.all_valid());
    let seen: Vec<String> = pipeline
        .prober()
        .seen()
        .into_iter()
        .map(|(address, _)| address)
        .collect();
    assert_eq!(seen, vec!["x@good.com", "y@example.com", "z@good.com"]);
}

#[test]
fn tiny_queue_still_completes() {
    let pipeline = pipeline(uneven_probe());
    let addresses: Vec<String> = (0..16).map(|n| format!("user{n}@good.com")).collect();
    let options = BatchOptions {
        workers: 3,
        back_pressure: 1,
    };

    let job = BatchRunner::new(&pipeline, options).run(&addresses, |_| {});

    assert_eq!(job.valid_count(), 16);
}

#[test]
fn shared_domain_resolved_once_across_workers() {
    let stub = routing_stub();
    let calls = stub.calls.clone();
    let pipeline = VerificationPipeline::new(
        ValidationMode::Strict,
        MxResolver::new(stub),
        RecordingProbe::accepting(),
    );
    let addresses: Vec<String> = (0..20).map(|n| format!("user{n}@good.com")).collect();

    BatchRunner::new(&pipeline, BatchOptions::default()).run(&addresses, |_| {});

    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[cfg(feature = "with-csv")]
mod table {
    use super::*;

    const INPUT: &str = "name,email\nAda,a@good.com\nBob,bad-syntax\nCy,c@no-mx.com\n";

    #[test]
    fn missing_email_column_is_rejected() {
        let err = AddressTable::from_reader("name,mail\nAda,a@good.com\n".as_bytes())
            .expect_err("no email column");
        assert!(matches!(err, BatchInputError::MissingEmailColumn { .. }));
        assert!(err.to_string().contains("name, mail"), "{err}");
    }

    #[test]
    fn email_column_is_case_sensitive() {
        let err = AddressTable::from_reader("Email\na@good.com\n".as_bytes())
            .expect_err("header case differs");
        assert!(matches!(err, BatchInputError::MissingEmailColumn { .. }));
    }

    #[test]
    fn short_row_is_invalid_and_neighbours_are_verified() {
        let input = "name,email\nAda,a@good.com\nBob\nCy,c@good.com\n";
        let mut table = AddressTable::from_reader(input.as_bytes()).expect("table");
        assert_eq!(table.addresses(), vec!["a@good.com", "", "c@good.com"]);

        let pipeline = pipeline(RecordingProbe::accepting());
        let job = BatchRunner::new(&pipeline, BatchOptions::default())
            .run(&table.addresses(), |_| {});
        table.apply(&job).expect("apply");

        assert_eq!(pipeline.prober().calls(), 2);
        let csv = String::from_utf8(table.to_csv_bytes().expect("export")).expect("utf8");
        insta::assert_snapshot!(csv.trim_end(), @r"
        name,email,status
        Ada,a@good.com,VALID
        Bob,,INVALID
        Cy,c@good.com,VALID
        ");
    }

    #[test]
    fn csv_error_message_is_shown_once() {
        let err = AddressTable::from_reader(&b"name,email\n\xff,a@good.com\n"[..])
            .expect_err("invalid utf-8");
        match &err {
            BatchInputError::Csv(inner) => assert_eq!(err.to_string(), inner.to_string()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn rows_start_pending() {
        let table = AddressTable::from_reader(INPUT.as_bytes()).expect("table");
        assert_eq!(table.addresses(), vec!["a@good.com", "bad-syntax", "c@no-mx.com"]);
        assert!(table.statuses().iter().all(|s| *s == RowStatus::Pending));
    }

    #[test]
    fn annotated_export_appends_status() {
        let mut table = AddressTable::from_reader(INPUT.as_bytes()).expect("table");
        let pipeline = pipeline(RecordingProbe::accepting());

        let job = BatchRunner::new(&pipeline, BatchOptions::default())
            .run(&table.addresses(), |_| {});
        table.apply(&job).expect("apply");

        let csv = String::from_utf8(table.to_csv_bytes().expect("export")).expect("utf8");
        insta::assert_snapshot!(csv.trim_end(), @r"
        name,email,status
        Ada,a@good.com,VALID
        Bob,bad-syntax,INVALID
        Cy,c@no-mx.com,INVALID
        ");
    }

    #[test]
    fn existing_status_column_is_overwritten() {
        let input = "status,email\nold,a@good.com\nold,c@no-mx.com\n";
        let mut table = AddressTable::from_reader(input.as_bytes()).expect("table");
        let pipeline = pipeline(RecordingProbe::accepting());

        let job = BatchRunner::new(&pipeline, BatchOptions::sequential())
            .run(&table.addresses(), |_| {});
        table.apply(&job).expect("apply");

        let csv = String::from_utf8(table.to_csv_bytes().expect("export")).expect("utf8");
        assert_eq!(csv, "status,email\nVALID,a@good.com\nINVALID,c@no-mx.com\n");
    }

    #[test]
    fn mismatched_job_is_refused() {
        let mut table = AddressTable::from_reader(INPUT.as_bytes()).expect("table");
        let err = table.apply(&BatchJob::default()).expect_err("length mismatch");
        assert!(matches!(
            err,
            BatchInputError::RowCountMismatch {
                expected: 3,
                actual: 0
            }
        ));
    }
}
