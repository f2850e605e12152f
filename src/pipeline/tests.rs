use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use super::*;
use crate::mx::tests::StubResolver;
use crate::mx::{AbsentReason, MxRecord, MxRecordSet};
use crate::smtp::{ProbeReport, ProbeStage, SmtpReply};
use crate::validator::EmailAddress;

type ProbeFn = dyn Fn(&EmailAddress, &MxRecordSet) -> ProbeOutcome + Send + Sync;

/// Probe double that records who it was asked about.
pub(crate) struct RecordingProbe {
    on_probe: Box<ProbeFn>,
    calls: AtomicUsize,
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingProbe {
    pub(crate) fn new<F>(f: F) -> Self
    where
        F: Fn(&EmailAddress, &MxRecordSet) -> ProbeOutcome + Send + Sync + 'static,
    {
        Self {
            on_probe: Box::new(f),
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn accepting() -> Self {
        Self::new(|_, hosts| accepted(&hosts.primary().exchange))
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// `(address, top host)` pairs in call order.
    pub(crate) fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().clone()
    }
}

impl MailboxProbe for RecordingProbe {
    fn probe(&self, address: &EmailAddress, hosts: &MxRecordSet) -> ProbeReport {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .push((address.to_string(), hosts.primary().exchange.clone()));
        ProbeReport::new((self.on_probe)(address, hosts))
    }
}

pub(crate) fn accepted(host: &str) -> ProbeOutcome {
    ProbeOutcome::Accepted {
        host: host.to_string(),
        reply: SmtpReply {
            code: 250,
            lines: vec!["2.1.5 Ok".to_string()],
        },
    }
}

pub(crate) fn rejected(host: &str) -> ProbeOutcome {
    ProbeOutcome::Rejected {
        host: host.to_string(),
        stage: ProbeStage::RcptTo,
        reply: SmtpReply {
            code: 550,
            lines: vec!["5.1.1 User unknown".to_string()],
        },
    }
}

/// `good.com` and `example.com` route to `mail.<domain>`, anything else has
/// no MX records.
pub(crate) fn routing_stub() -> StubResolver {
    StubResolver::new(|domain| match domain {
        "example.com" | "good.com" => Ok(vec![MxRecord::new(10, format!("mail.{domain}"))]),
        _ => Ok(Vec::new()),
    })
}

fn pipeline<P: MailboxProbe>(probe: P) -> VerificationPipeline<StubResolver, P> {
    VerificationPipeline::new(
        ValidationMode::Strict,
        MxResolver::new(routing_stub()),
        probe,
    )
}

#[test]
fn deliverable_address_is_valid() {
    let pipeline = pipeline(RecordingProbe::accepting());

    let result = pipeline.verify_detailed("user@example.com");

    assert_eq!(result.status, Status::Valid);
    assert!(result.rejection.is_none());
    assert_eq!(
        pipeline.prober().seen(),
        vec![("user@example.com".to_string(), "mail.example.com".to_string())]
    );
}

#[test]
fn bad_syntax_costs_nothing() {
    let pipeline = pipeline(RecordingProbe::accepting());

    let result = pipeline.verify_detailed("not-an-email");

    assert_eq!(result.status, Status::Invalid);
    assert!(result.address.is_none());
    assert!(matches!(
        result.rejection,
        Some(Rejection::SyntaxInvalid { ref reasons }) if !reasons.is_empty()
    ));
    assert_eq!(pipeline.resolver().cache().len(), 0);
    assert_eq!(pipeline.prober().calls(), 0);
}

#[test]
fn no_mx_domain_is_invalid_and_cached_absent() {
    let pipeline = pipeline(RecordingProbe::accepting());

    assert_eq!(pipeline.verify("user@no-mx-domain.test"), Status::Invalid);

    assert_eq!(
        pipeline.resolver().cache().get("no-mx-domain.test"),
        Some(MxStatus::Absent(AbsentReason::NoRecords))
    );
    assert_eq!(pipeline.prober().calls(), 0);
}

#[test]
fn rejected_recipient_is_invalid() {
    let pipeline = pipeline(RecordingProbe::new(|_, hosts| {
        rejected(&hosts.primary().exchange)
    }));

    let result = pipeline.verify_detailed("ghost@example.com");

    assert_eq!(result.status, Status::Invalid);
    match result.rejection {
        Some(Rejection::ProbeRejected { host, reply, .. }) => {
            assert_eq!(host, "mail.example.com");
            assert_eq!(reply.code, 550);
        }
        other => panic!("unexpected rejection: {other:?}"),
    }
}

#[test]
fn unreachable_exchanger_is_invalid() {
    let pipeline = pipeline(RecordingProbe::new(|_, hosts| ProbeOutcome::Unreachable {
        host: Some(hosts.primary().exchange.clone()),
        reason: "connection refused".to_string(),
    }));

    let result = pipeline.verify_detailed("user@good.com");

    assert_eq!(result.status, Status::Invalid);
    assert!(matches!(
        result.rejection,
        Some(Rejection::ProbeUnreachable { host: Some(_), .. })
    ));
}

#[test]
fn same_domain_is_resolved_once() {
    let stub = routing_stub();
    let calls = stub.calls.clone();
    let pipeline = VerificationPipeline::new(
        ValidationMode::Strict,
        MxResolver::new(stub),
        RecordingProbe::accepting(),
    );

    assert_eq!(pipeline.verify("a@good.com"), Status::Valid);
    assert_eq!(pipeline.verify("b@GOOD.com"), Status::Valid);
    assert_eq!(pipeline.verify("c@no-mx.com"), Status::Invalid);
    assert_eq!(pipeline.verify("d@no-mx.com"), Status::Invalid);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(pipeline.prober().calls(), 2);
}

#[test]
fn internationalized_domain_is_looked_up_in_ascii() {
    let stub = StubResolver::new(|domain| {
        assert_eq!(domain, "xn--exmple-cua.com");
        Ok(vec![MxRecord::new(5, "mx.xn--exmple-cua.com")])
    });
    let pipeline = VerificationPipeline::new(
        ValidationMode::Strict,
        MxResolver::new(stub),
        RecordingProbe::accepting(),
    );

    let result = pipeline.verify_detailed("user@Exämple.com");

    assert!(result.is_valid(), "{result:?}");
    assert_eq!(
        result.address.map(|address| address.to_string()),
        Some("user@xn--exmple-cua.com".to_string())
    );
}

#[test]
fn rejection_reads_well() {
    let rejection = Rejection::NoRoute {
        domain: "no-mx.com".to_string(),
        reason: AbsentReason::NoRecords,
    };
    insta::assert_snapshot!(rejection.to_string(), @"no mail route for no-mx.com: no MX records");
}
