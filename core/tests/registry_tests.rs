// tests/registry_tests.rs
mod common;

use common::*;
use techlab_core::{ContextData, FlowError, Pipeline, PipelineControl, PipelineResult, Registry};

#[derive(Debug, Default)]
struct SignupDraft {
  email: String,
  accepted: bool,
}

#[tokio::test]
async fn dispatches_by_context_type() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let mut checkout = Pipeline::<OrderDraft, TestError>::new(&[("price", false, None)]);
  checkout.on("price", add_to_total("price", 2000)).unwrap();
  registry.register(checkout);

  let mut signup = Pipeline::<SignupDraft, FlowError>::new(&[("accept", false, None)]);
  signup
    .on("accept", |ctx: ContextData<SignupDraft>| async move {
      let mut draft = ctx.write();
      draft.accepted = !draft.email.is_empty();
      Ok::<_, FlowError>(PipelineControl::Continue)
    })
    .unwrap();
  registry.register(signup);

  assert_eq!(registry.len(), 2);
  assert!(registry.contains::<SignupDraft>());

  let order = ContextData::new(OrderDraft::default());
  assert_eq!(registry.run(order.clone()).await.unwrap(), PipelineResult::Completed);
  assert_eq!(order.read().total_cents, 2000);

  let user = ContextData::new(SignupDraft {
    email: "ana@example.com".into(),
    accepted: false,
  });
  registry.run(user.clone()).await.unwrap();
  assert!(user.read().accepted);
}

#[tokio::test]
async fn unregistered_context_type_is_an_error() {
  setup_tracing();
  let registry = Registry::<TestError>::new();
  assert!(registry.is_empty());

  let err = registry.run(ContextData::new(SignupDraft::default())).await.unwrap_err();

  match err {
    TestError::Flow(msg) => assert!(msg.contains("NotRegistered")),
    other => panic!("expected NotRegistered, got {:?}", other),
  }
}

#[tokio::test]
async fn later_registration_replaces_earlier() {
  setup_tracing();
  let registry = Registry::<TestError>::new();

  let mut first = Pipeline::<OrderDraft, TestError>::new(&[("price", false, None)]);
  first.on("price", add_to_total("first", 1)).unwrap();
  registry.register(first);

  let mut second = Pipeline::<OrderDraft, TestError>::new(&[("price", false, None)]);
  second.on("price", add_to_total("second", 2)).unwrap();
  registry.register(second);

  let ctx = ContextData::new(OrderDraft::default());
  registry.run(ctx.clone()).await.unwrap();

  assert_eq!(registry.len(), 1);
  assert_eq!(ctx.read().steps_executed, vec!["second"]);
}
