//! Unit tests for the change controller.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use camino::Utf8PathBuf;
use ncm_command::{ActionError, CommandError};
use ncm_config::FrrRestartMode;
use rstest::{fixture, rstest};

use super::*;
use crate::datastore::{Edit, MemoryDatastore};
use crate::factory::NiHandlerFactory;
use crate::handler::HandlerOpt;
use crate::handlers::Tools;
use crate::health::{MockHealthReporter, StructuredHealthReporter};
use crate::schema::NetworkInstance;

const MODULE: &str = "beluganos-network-instance";

fn instance(name: &str) -> String {
    format!("/{MODULE}:network-instances/network-instance[name='{name}']")
}

fn set(path: String, value: &str) -> Edit {
    Edit::Set {
        path,
        value: value.to_owned(),
    }
}

type Calls = Arc<Mutex<Vec<(Phase, Operation, String)>>>;

/// Records every `begin` and fails commits for one instance name.
struct RecordingHandler {
    phase: Phase,
    operation: Operation,
    calls: Calls,
    fail_commit: Option<String>,
    rollbacks: Arc<Mutex<usize>>,
    current: String,
}

impl ChangeHandler<NetworkInstance> for RecordingHandler {
    fn begin(&mut self, name: &str, _entity: &NetworkInstance) -> Result<(), HandlerError> {
        self.current = name.to_owned();
        self.calls
            .lock()
            .expect("calls mutex")
            .push((self.phase, self.operation, name.to_owned()));
        Ok(())
    }

    fn commit(&mut self) -> Result<(), HandlerError> {
        if self.fail_commit.as_deref() == Some(self.current.as_str()) {
            return Err(HandlerError::Command(CommandError::Commit {
                index: 0,
                command: "fail".to_owned(),
                source: ActionError::failed("deliberate"),
            }));
        }
        Ok(())
    }

    fn rollback(&mut self) {
        *self.rollbacks.lock().expect("rollbacks mutex") += 1;
    }

    fn set_opt(&mut self, _opt: HandlerOpt) {}
}

#[derive(Default)]
struct RecordingFactory {
    calls: Calls,
    fail_commit: Option<String>,
    rollbacks: Arc<Mutex<usize>>,
}

impl HandlerFactory<NetworkInstance> for RecordingFactory {
    fn new_handler(
        &self,
        phase: Phase,
        operation: Operation,
        _inventory: Arc<Inventory>,
    ) -> Option<Box<dyn ChangeHandler<NetworkInstance>>> {
        Some(Box::new(RecordingHandler {
            phase,
            operation,
            calls: Arc::clone(&self.calls),
            fail_commit: self.fail_commit.clone(),
            rollbacks: Arc::clone(&self.rollbacks),
            current: String::new(),
        }))
    }
}

#[fixture]
fn datastore() -> Arc<MemoryDatastore> {
    let datastore = Arc::new(MemoryDatastore::new());
    datastore
        .commit(&[
            set(format!("{}/config/description", instance("PE1")), "first"),
            set(format!("{}/config/description", instance("PE2")), "second"),
        ])
        .expect("seed running store");
    datastore
}

fn controller(
    datastore: &Arc<MemoryDatastore>,
    factory: Arc<dyn HandlerFactory<NetworkInstance>>,
) -> Arc<ChangeController<NetworkInstance>> {
    Arc::new(ChangeController::new(
        Arc::clone(datastore) as Arc<dyn Datastore>,
        factory,
        MODULE,
        Arc::new(StructuredHealthReporter::new()),
    ))
}

#[rstest]
fn operations_run_modified_then_deleted_then_created(datastore: Arc<MemoryDatastore>) {
    let factory = Arc::new(RecordingFactory::default());
    let calls = Arc::clone(&factory.calls);
    let controller = controller(&datastore, factory);
    let _subscription =
        ChangeController::subscribe(&controller, SubscribeFlags::default()).expect("subscribe");

    datastore
        .commit(&[
            set(format!("{}/config/description", instance("PE3")), "third"),
            Edit::Delete {
                path: instance("PE2"),
            },
            set(format!("{}/config/description", instance("PE1")), "changed"),
        ])
        .expect("transaction applies");

    let recorded = calls.lock().expect("calls mutex").clone();
    let expected: Vec<(Phase, Operation, String)> = [Phase::Verify, Phase::Apply]
        .into_iter()
        .flat_map(|phase| {
            [
                (phase, Operation::Modified, "PE1".to_owned()),
                (phase, Operation::Deleted, "PE2".to_owned()),
                (phase, Operation::Created, "PE3".to_owned()),
            ]
        })
        .collect();
    assert_eq!(recorded, expected);
}

#[rstest]
fn commit_failures_roll_back_and_report_internal(datastore: Arc<MemoryDatastore>) {
    let factory = Arc::new(RecordingFactory {
        fail_commit: Some("PE1".to_owned()),
        ..RecordingFactory::default()
    });
    let rollbacks = Arc::clone(&factory.rollbacks);
    let controller = controller(&datastore, factory);

    assert_eq!(controller.module_change(MODULE, Phase::Apply), Ok(()));

    let _subscription = ChangeController::subscribe(
        &controller,
        SubscribeFlags {
            apply_only: true,
            enabled: false,
        },
    )
    .expect("subscribe");
    let outcome = datastore.commit(&[set(
        format!("{}/config/description", instance("PE1")),
        "changed",
    )]);

    match outcome {
        Err(DatastoreError::ApplyFailed { module, source }) => {
            assert_eq!(module, MODULE);
            assert_eq!(source.code, ErrorCode::Internal);
            assert!(source.message.contains("PE1"), "{}", source.message);
        }
        other => panic!("expected an apply failure, got {other:?}"),
    }
    assert_eq!(*rollbacks.lock().expect("rollbacks mutex"), 1);
}

#[fixture]
fn dry_run_factory() -> Arc<NiHandlerFactory> {
    let tools = Tools {
        lxd: Utf8PathBuf::from("/nonexistent/lxd"),
        lxcinit: Utf8PathBuf::from("/nonexistent/lxcinit"),
        sys: Utf8PathBuf::from("/nonexistent/sys"),
        vty: Utf8PathBuf::from("/nonexistent/vty"),
        frr_restart: FrrRestartMode::None,
    };
    Arc::new(NiHandlerFactory::new(Arc::new(tools), true, 9000))
}

#[rstest]
fn invalid_addresses_are_rejected_in_verify(
    datastore: Arc<MemoryDatastore>,
    dry_run_factory: Arc<NiHandlerFactory>,
) {
    let mut reporter = MockHealthReporter::new();
    reporter.expect_subscribed().times(1).return_const(());
    reporter
        .expect_notification_rejected()
        .withf(|module, phase, _| module == MODULE && *phase == Phase::Verify)
        .times(1)
        .return_const(());
    reporter.expect_notification_processed().never();
    let controller = Arc::new(ChangeController::new(
        Arc::clone(&datastore) as Arc<dyn Datastore>,
        dry_run_factory,
        MODULE,
        Arc::new(reporter),
    ));
    let _subscription =
        ChangeController::subscribe(&controller, SubscribeFlags::default()).expect("subscribe");
    let before = datastore.items(Store::Running);

    let address = format!(
        "{}/loopbacks/loopback[id='lo1']/addresses/address[index='0']/config/ip",
        instance("PE1")
    );
    let error = datastore
        .commit(&[set(address, "10.0.0.1")])
        .expect_err("prefix-length is missing");

    match error {
        DatastoreError::Rejected { source, .. } => {
            assert_eq!(source.code, ErrorCode::ValidationFailed);
            assert!(
                source.message.contains("prefix-length not specified"),
                "{}",
                source.message
            );
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
    assert_eq!(datastore.items(Store::Running), before);
}

#[rstest]
fn applied_changes_are_persisted_in_the_background(
    datastore: Arc<MemoryDatastore>,
    dry_run_factory: Arc<NiHandlerFactory>,
) {
    let controller = Arc::new(
        ChangeController::new(
            Arc::clone(&datastore) as Arc<dyn Datastore>,
            dry_run_factory,
            MODULE,
            Arc::new(StructuredHealthReporter::new()),
        )
        .with_persist(true),
    );
    let _subscription =
        ChangeController::subscribe(&controller, SubscribeFlags::default()).expect("subscribe");

    datastore
        .commit(&[set(
            format!("{}/config/description", instance("PE1")),
            "changed",
        )])
        .expect("transaction applies");

    assert!(datastore.wait_for_copies(1, Duration::from_secs(5)));
    assert_eq!(
        datastore.copies(),
        vec![(MODULE.to_owned(), Store::Running, Store::Startup)]
    );
    let startup = datastore.items(Store::Startup);
    assert_eq!(
        startup
            .get(&format!("{}/config/description", instance("PE1")))
            .map(String::as_str),
        Some("changed")
    );
}

#[rstest]
fn dropping_the_subscription_stops_notifications(datastore: Arc<MemoryDatastore>) {
    let factory = Arc::new(RecordingFactory::default());
    let calls = Arc::clone(&factory.calls);
    let controller = controller(&datastore, factory);

    let subscription =
        ChangeController::subscribe(&controller, SubscribeFlags::default()).expect("subscribe");
    assert_eq!(datastore.subscriber_count(), 1);
    drop(subscription);
    assert_eq!(datastore.subscriber_count(), 0);

    datastore
        .commit(&[set(
            format!("{}/config/description", instance("PE1")),
            "unseen",
        )])
        .expect("transaction applies");
    assert!(calls.lock().expect("calls mutex").is_empty());
}
