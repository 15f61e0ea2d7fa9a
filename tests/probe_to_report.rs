//! Seed list through the worker pool, into NDJSON, back out and classified.

use std::collections::HashMap;
use std::time::Duration;

use futures::TryStreamExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use rangeprobe::classify::{FilterMode, classify};
use rangeprobe::http_probe::prelude::*;
use rangeprobe::ndjson::{self, NdjsonSink};
use rangeprobe::pool::probe_all;
use rangeprobe::seed::read_seed_urls;

/// Honours ranges only when the client did not offer compression.
struct DropsRangeWhenCompressing;

impl Respond for DropsRangeWhenCompressing {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let accept = request
            .headers
            .get("accept-encoding")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if accept.contains("gzip") {
            ResponseTemplate::new(200).insert_header("content-encoding", "gzip")
        } else {
            ResponseTemplate::new(206)
        }
    }
}

#[tokio::test]
async fn test_probe_run_round_trips_through_ndjson() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/good"))
        .respond_with(ResponseTemplate::new(206))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/compressing"))
        .respond_with(DropsRangeWhenCompressing)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/no-ranges"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let base = server.uri();
    let seeds = format!(
        "{{\"url\":\"{base}/good\"}}\n{{\"url\":\"{base}/compressing\"}}\n\n{{\"url\":\"{base}/no-ranges\"}}\n{{\"url\":\"{base}/missing\"}}"
    );
    let urls = read_seed_urls(std::io::Cursor::new(seeds.into_bytes()))
        .await
        .expect("seeds");
    assert_eq!(urls.len(), 4);

    let client = build_client("rangeprobe-test/1.0", Duration::from_secs(5)).expect("client");
    let (sink, writer) = NdjsonSink::spawn(Vec::new());
    let probed = probe_all(Prober::new(client), urls.clone(), 2, sink)
        .await
        .expect("pool");
    assert_eq!(probed, 4);
    let output = writer.await.expect("join").expect("write").writer;

    let records: Vec<ProbeRecord> = ndjson::from_reader(std::io::Cursor::new(output))
        .try_collect()
        .await
        .expect("decode");
    assert_eq!(records.len(), 4);

    let by_url: HashMap<&str, &ProbeRecord> =
        records.iter().map(|r| (r.url.as_str(), r)).collect();
    for url in &urls {
        assert!(by_url.contains_key(url.as_str()), "no record for {url}");
    }

    let good = by_url[format!("{base}/good").as_str()];
    assert!(good.slots().all(|(_, r)| *r == VariantResult::response(206, "")));

    let compressing = by_url[format!("{base}/compressing").as_str()];
    assert_eq!(
        compressing.accept_encoding,
        VariantResult::response(200, "gzip")
    );

    let missing = by_url[format!("{base}/missing").as_str()];
    assert!(missing.slots().all(|(_, r)| r.status() == Some(404)));

    let enc_no_206: Vec<&str> = classify(&records, FilterMode::EncNo206)
        .into_iter()
        .map(|r| r.url.as_str())
        .collect();
    assert_eq!(enc_no_206, vec![format!("{base}/compressing")]);

    assert_eq!(classify(&records, FilterMode::None).len(), 4);
    assert!(classify(&records, FilterMode::UnexpectedEncoding).is_empty());
}
