mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{RecordingSink, StaticFetcher, LISTING_URL};
use harvester_engine::{
    Credentials, EngineEvent, FailurePolicy, HarvestError, NullSink, SizeProber,
};
use url::Url;

fn hrefs(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("/archives/list.{i:04}.mbox")).collect()
}

fn fetcher_for(hrefs: &[String]) -> StaticFetcher {
    hrefs
        .iter()
        .enumerate()
        .fold(StaticFetcher::new(""), |fetcher, (i, href)| {
            fetcher.with_body(href, 100 * (i + 1))
        })
}

fn listing_url() -> Url {
    Url::parse(LISTING_URL).unwrap()
}

#[tokio::test]
async fn every_probe_lands_in_the_table() {
    let links = hrefs(25);
    let fetcher = Arc::new(fetcher_for(&links).with_probe_delay(Duration::from_millis(5)));
    let sink = RecordingSink::new();

    let report = SizeProber::new(fetcher)
        .probe_all(&listing_url(), &links, &Credentials::anonymous(), &sink)
        .await
        .expect("probe ok");

    assert_eq!(report.sizes.len(), 25);
    assert_eq!(report.sizes.probe_count(), 25);
    assert!(report.failed.is_empty());
    assert_eq!(report.sizes.get("list.0000.mbox"), Some(100));
    assert_eq!(report.sizes.get("list.0024.mbox"), Some(2500));
    assert_eq!(report.sizes.total_size(), (1..=25).map(|i| 100 * i).sum::<u64>());

    let probed = sink
        .events()
        .iter()
        .filter(|event| matches!(event, EngineEvent::SizeProbed { .. }))
        .count();
    assert_eq!(probed, 25);
    assert_eq!(
        sink.events().last(),
        Some(&EngineEvent::ProbingFinished {
            resources: 25,
            total_size: report.sizes.total_size(),
        })
    );
}

#[tokio::test]
async fn unbounded_probing_runs_all_at_once() {
    let links = hrefs(12);
    let fetcher = Arc::new(fetcher_for(&links).with_probe_delay(Duration::from_millis(30)));

    SizeProber::new(fetcher.clone())
        .probe_all(&listing_url(), &links, &Credentials::anonymous(), &NullSink)
        .await
        .unwrap();

    assert!(fetcher.max_in_flight() > 2);
}

#[tokio::test]
async fn concurrency_limit_caps_in_flight_probes() {
    let links = hrefs(12);
    let fetcher = Arc::new(fetcher_for(&links).with_probe_delay(Duration::from_millis(10)));

    let report = SizeProber::new(fetcher.clone())
        .with_max_concurrent(Some(2))
        .probe_all(&listing_url(), &links, &Credentials::anonymous(), &NullSink)
        .await
        .unwrap();

    assert_eq!(report.sizes.len(), 12);
    assert!(fetcher.max_in_flight() <= 2);
}

#[tokio::test]
async fn duplicate_hrefs_share_an_entry_but_count_twice() {
    let links = vec!["/archives/a.mbox".to_string(), "/archives/a.mbox".to_string()];
    let fetcher = Arc::new(StaticFetcher::new("").with_body("/archives/a.mbox", 700));

    let report = SizeProber::new(fetcher)
        .probe_all(&listing_url(), &links, &Credentials::anonymous(), &NullSink)
        .await
        .unwrap();

    assert_eq!(report.sizes.len(), 1);
    assert_eq!(report.sizes.probe_count(), 2);
    assert_eq!(report.sizes.total_size(), 1400);
}

#[tokio::test]
async fn same_basename_keeps_a_size_per_href() {
    let links = vec![
        "/2023/x.mbox".to_string(),
        "/2024/x.mbox".to_string(),
        "/2025/x.mbox".to_string(),
    ];
    let fetcher = Arc::new(
        StaticFetcher::new("")
            .with_body("/2023/x.mbox", 100)
            .with_body("/2024/x.mbox", 300),
    );

    let report = SizeProber::new(fetcher)
        .with_failure_policy(FailurePolicy::ContinueOnResourceFailure)
        .probe_all(&listing_url(), &links, &Credentials::anonymous(), &NullSink)
        .await
        .unwrap();

    assert_eq!(report.resource_sizes, vec![Some(100), Some(300), None]);
    assert_eq!(report.sizes.total_size(), 400);
    assert_eq!(report.failed.len(), 1);
}

#[tokio::test]
async fn first_failed_probe_aborts_under_fail_fast() {
    let mut links = hrefs(5);
    let fetcher = Arc::new(fetcher_for(&links));
    links.push("/archives/missing.mbox".to_string());

    let err = SizeProber::new(fetcher)
        .probe_all(&listing_url(), &links, &Credentials::anonymous(), &NullSink)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        HarvestError::UnexpectedStatus {
            status: 404,
            url: "http://archive.test/archives/missing.mbox".to_string(),
        }
    );
}

#[tokio::test]
async fn failed_probes_are_recorded_when_continuing() {
    let mut links = hrefs(3);
    let fetcher = Arc::new(fetcher_for(&links));
    links.insert(1, "/archives/missing.mbox".to_string());
    let sink = RecordingSink::new();

    let report = SizeProber::new(fetcher)
        .with_failure_policy(FailurePolicy::ContinueOnResourceFailure)
        .probe_all(&listing_url(), &links, &Credentials::anonymous(), &sink)
        .await
        .unwrap();

    assert_eq!(report.sizes.len(), 3);
    assert!(!report.sizes.contains("missing.mbox"));
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].name, "missing.mbox");
    assert!(sink
        .events()
        .iter()
        .any(|event| matches!(event, EngineEvent::ResourceFailed { name, .. } if name == "missing.mbox")));
}

#[tokio::test]
async fn probes_use_the_harvest_credentials() {
    let links = hrefs(2);
    let fetcher = Arc::new(fetcher_for(&links));
    let credentials = Credentials::basic("archives", "antispam");

    SizeProber::new(fetcher.clone())
        .probe_all(&listing_url(), &links, &credentials, &NullSink)
        .await
        .unwrap();

    assert_eq!(fetcher.credentials_seen(), vec![credentials.clone(), credentials]);
}

#[tokio::test]
async fn empty_listing_probes_nothing() {
    let fetcher = Arc::new(StaticFetcher::new(""));

    let report = SizeProber::new(fetcher)
        .probe_all(&listing_url(), &[], &Credentials::anonymous(), &NullSink)
        .await
        .unwrap();

    assert!(report.sizes.is_empty());
    assert_eq!(report.sizes.total_size(), 0);
}
