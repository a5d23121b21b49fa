//! End-to-end request/reply loop over the in-memory broker: one served
//! service, invoked through the call primitive.

use std::sync::Arc;
use std::time::Duration;

use sy_broker::{Broker, MemoryBroker};
use sy_domain::Error;
use sy_protocol::{
    Payload, REQUEST_EXCHANGE, RequestArgs, RequestEnvelope, ResultStatus, WireErrorKind,
};
use sy_service::{RpcServer, ServiceBuilder, call, operation_fn};
use tokio_util::sync::CancellationToken;

const DEADLINE: Duration = Duration::from_secs(2);

/// Spawn a demo service and return the broker plus its shutdown token.
async fn start_demo() -> (Arc<MemoryBroker>, CancellationToken) {
    let broker: Arc<MemoryBroker> = Arc::new(MemoryBroker::new());

    let service = ServiceBuilder::new("demo", "svc.demo")
        .version("1.2.3")
        .operation(
            "echo",
            "* `words` / Condition: optional / Type: list\nReturns: str\n",
            operation_fn(|args: Vec<String>| async move { Ok(Payload::Text(args.join(" "))) }),
        )
        .operation(
            "always_faults",
            "Returns: str\n",
            operation_fn(|_args| async { Err(Error::Handler("intentional fault".into())) }),
        )
        .operation(
            "raw_bytes",
            "Returns: bytes\n",
            operation_fn(|_args| async { Ok(Payload::Binary(vec![0x00, 0xff, 0x10])) }),
        )
        .build();

    let server = RpcServer::new(broker.clone(), Arc::new(service));
    let shutdown = CancellationToken::new();
    let token = shutdown.clone();
    tokio::spawn(async move {
        server.serve(token).await.unwrap();
    });
    // Let the server bind its queue before the first publish.
    tokio::task::yield_now().await;

    (broker, shutdown)
}

#[tokio::test]
async fn exposed_operation_passes() {
    let (broker, shutdown) = start_demo().await;

    let request = RequestEnvelope::new(
        "echo",
        RequestArgs::List(vec!["hello".into(), "there".into()]),
    );
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.demo", &request, DEADLINE)
        .await
        .unwrap();

    assert_eq!(reply.request, "echo");
    assert_eq!(reply.result, ResultStatus::Pass);
    assert_eq!(reply.result_data, "hello there");
    shutdown.cancel();
}

#[tokio::test]
async fn scalar_and_absent_args_normalize() {
    let (broker, shutdown) = start_demo().await;

    let scalar = RequestEnvelope::new("echo", RequestArgs::Scalar("solo".into()));
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.demo", &scalar, DEADLINE)
        .await
        .unwrap();
    assert_eq!(reply.result_data, "solo");

    let absent = RequestEnvelope::new("echo", RequestArgs::None);
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.demo", &absent, DEADLINE)
        .await
        .unwrap();
    assert_eq!(reply.result, ResultStatus::Pass);
    assert_eq!(reply.result_data, "");
    shutdown.cancel();
}

#[tokio::test]
async fn unknown_operation_fails_with_fixed_payload() {
    let (broker, shutdown) = start_demo().await;

    let request = RequestEnvelope::new("no_such_op", RequestArgs::None);
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.demo", &request, DEADLINE)
        .await
        .unwrap();

    assert_eq!(reply.result, ResultStatus::Fail);
    assert_eq!(reply.result_data, sy_protocol::UNSUPPORTED_PAYLOAD);
    shutdown.cancel();
}

#[tokio::test]
async fn handler_fault_becomes_exception() {
    let (broker, shutdown) = start_demo().await;

    let request = RequestEnvelope::new("always_faults", RequestArgs::None);
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.demo", &request, DEADLINE)
        .await
        .unwrap();

    assert_eq!(reply.result, ResultStatus::Exception);
    let err = reply.wire_error().unwrap();
    assert_eq!(err.kind, WireErrorKind::Handler);
    assert!(err.message.contains("intentional fault"));
    shutdown.cancel();
}

#[tokio::test]
async fn binary_payload_survives_the_wire() {
    let (broker, shutdown) = start_demo().await;

    let request = RequestEnvelope::new("raw_bytes", RequestArgs::None);
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.demo", &request, DEADLINE)
        .await
        .unwrap();

    assert_eq!(reply.result, ResultStatus::Pass);
    let bytes = Payload::decode_binary(&reply.result_data).unwrap();
    assert_eq!(bytes, vec![0x00, 0xff, 0x10]);
    shutdown.cancel();
}

#[tokio::test]
async fn get_version_is_always_exposed() {
    let (broker, shutdown) = start_demo().await;

    let request = RequestEnvelope::new("get_version", RequestArgs::None);
    let reply = call(broker.as_ref(), REQUEST_EXCHANGE, "svc.demo", &request, DEADLINE)
        .await
        .unwrap();

    assert_eq!(reply.result, ResultStatus::Pass);
    assert_eq!(reply.result_data, "1.2.3");
    shutdown.cancel();
}

#[tokio::test]
async fn call_against_nothing_times_out() {
    let broker = MemoryBroker::new();
    broker
        .declare_exchange(REQUEST_EXCHANGE, sy_broker::ExchangeKind::Direct)
        .await
        .unwrap();

    let request = RequestEnvelope::new("echo", RequestArgs::None);
    let err = call(
        &broker,
        REQUEST_EXCHANGE,
        "svc.absent",
        &request,
        Duration::from_millis(50),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)));
}

#[tokio::test]
async fn malformed_request_yields_decode_exception() {
    let (broker, shutdown) = start_demo().await;

    // Bypass the envelope type and publish junk directly, reply queue wired
    // up by hand.
    let reply_queue = broker.declare_ephemeral_queue().await.unwrap();
    let mut consumer = broker
        .consume(&reply_queue, sy_broker::AckMode::Auto)
        .await
        .unwrap();
    broker
        .publish(
            REQUEST_EXCHANGE,
            "svc.demo",
            b"not json".to_vec(),
            sy_broker::Properties {
                correlation_id: Some("junk-1".into()),
                reply_to: Some(reply_queue.clone()),
                persistent: false,
            },
        )
        .await
        .unwrap();

    let delivery = tokio::time::timeout(DEADLINE, consumer.recv())
        .await
        .unwrap()
        .unwrap();
    let reply = sy_protocol::ResponseEnvelope::decode(&delivery.body).unwrap();
    assert_eq!(reply.result, ResultStatus::Exception);
    assert_eq!(reply.wire_error().unwrap().kind, WireErrorKind::Decode);
    shutdown.cancel();
}
