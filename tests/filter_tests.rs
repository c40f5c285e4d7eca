use std::sync::Arc;

use vhost_hunter::analyze::fingerprint::{Fingerprint, ResponseFingerprint};
use vhost_hunter::analyze::{Baseline, ResponseClassifier, Verdict};
use vhost_hunter::probe::ProbeOutcome;
use vhost_hunter::FilterRule;

fn response(status: u16, title: Option<&str>) -> ProbeOutcome {
    ProbeOutcome {
        host: "candidate.example.com".into(),
        status,
        body: b"<html>page</html>".to_vec(),
        title: title.map(String::from),
        server: Some("Apache".into()),
        ..Default::default()
    }
}

fn classifier(filters: FilterRule) -> ResponseClassifier {
    let fp = ResponseFingerprint;
    let baseline = Baseline::new(Arc::new(fp), vec![fp.signature(&response(404, Some("Not Found")))]);
    ResponseClassifier::new(baseline, filters)
}

const CODES: [u16; 8] = [200, 204, 301, 302, 401, 403, 404, 500];

#[test]
fn only_codes_win_over_ignore_codes() {
    let c = classifier(FilterRule::new([200, 401], [200, 302], None, None));
    for code in CODES {
        let verdict = c.classify(&response(code, Some("Portal")));
        assert_eq!(verdict.is_visible(), code == 200 || code == 302, "code {}", code);
    }
}

#[test]
fn ignore_codes_hide_only_listed_statuses() {
    let c = classifier(FilterRule::new([404, 500], [], None, None));
    for code in CODES {
        let verdict = c.classify(&response(code, Some("Portal")));
        assert!(matches!(verdict, Verdict::Counted { .. }));
        assert_eq!(verdict.is_visible(), code != 404 && code != 500, "code {}", code);
    }
}

#[test]
fn baseline_match_is_never_visible() {
    let c = classifier(FilterRule::new([], [404], None, None));
    assert_eq!(c.classify(&response(404, Some("Not Found"))), Verdict::BaselineMatch);
    // same status, different title: a real vhost
    assert!(c.classify(&response(404, Some("Staging"))).is_visible());
}
