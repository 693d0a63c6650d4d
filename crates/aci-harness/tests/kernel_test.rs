//! Model kernel behaviour as seen through a plain broker session.

use std::sync::Arc;

use aci_core::{AciError, Broker, SessionConfig, Transport};
use aci_harness::{Fault, SimKernel, kernel::RC_BAD_CONTROL_BLOCK};
use aci_proto::{AciOption, Function, UowStatus, control_block::CONV_NEW};

fn session(kernel: &Arc<SimKernel>) -> Broker {
    let transport: Arc<dyn Transport> = kernel.clone();
    let mut broker = Broker::new(&SessionConfig::default(), transport).unwrap();
    broker.set_service("ACLASS", "ASERVER", "ASERVICE").unwrap();
    broker
}

#[test]
fn conversation_lifecycle() {
    let kernel = Arc::new(SimKernel::new());
    let mut broker = session(&kernel);

    broker.logon(None).unwrap();
    assert!(kernel.is_logged_on());

    broker.set_message(b"order 1").unwrap();
    broker.send(Some(CONV_NEW), None).unwrap();
    let conv_id = broker.conv_id();
    assert_eq!(conv_id.len(), 16);
    assert_eq!(broker.uow_status(), UowStatus::Received);
    assert!(!broker.uow_id().is_empty());
    assert_eq!(kernel.open_conversations(), vec![conv_id.clone()]);

    broker.commit().unwrap();
    assert!(broker.uow_id().is_empty());

    broker.end_conversation(None).unwrap();
    assert_eq!(kernel.ended_conversations(), vec![conv_id]);
    assert!(kernel.open_conversations().is_empty());

    broker.logoff().unwrap();
    assert!(!kernel.is_logged_on());
    assert_eq!(kernel.count(Function::Send), 1);
    assert_eq!(kernel.count(Function::Syncpoint), 1);
}

#[test]
fn send_with_eoc_ends_conversation() {
    let kernel = Arc::new(SimKernel::new());
    let mut broker = session(&kernel);

    broker.send(Some(CONV_NEW), None).unwrap();
    let conv_id = broker.conv_id();
    broker.send(None, Some(AciOption::Eoc)).unwrap();

    assert_eq!(kernel.ended_conversations(), vec![conv_id]);
    assert!(broker.conv_id().is_empty());
}

#[test]
fn receive_new_times_out_until_a_message_arrives() {
    let kernel = Arc::new(SimKernel::new());
    let mut broker = session(&kernel);

    let err = broker.receive_new(Some("NO")).unwrap_err();
    assert!(err.is_timeout());

    kernel.deliver(b"hello");
    broker.receive_new(Some("NO")).unwrap();
    assert_eq!(broker.received(), b"hello");
    assert_eq!(kernel.open_conversations(), vec![broker.conv_id()]);
}

#[test]
fn unknown_conversation_is_a_broker_error() {
    let kernel = Arc::new(SimKernel::new());
    let mut broker = session(&kernel);

    let err = broker.receive(Some("1234567890123456"), None, None).unwrap_err();
    assert_eq!(err.code().unwrap().to_string(), "00030003");

    let err = broker.end_conversation(None).unwrap_err();
    assert_eq!(err.code().unwrap().to_string(), "00030003");
}

#[test]
fn injected_faults_apply_once() {
    let kernel = Arc::new(SimKernel::new());
    let mut broker = session(&kernel);

    kernel.inject(Function::Send, Fault::ReturnCode(3));
    let err = broker.send(Some(CONV_NEW), None).unwrap_err();
    let AciError::Interface { rc, code, .. } = err else {
        unreachable!("return code faults surface as interface errors");
    };
    assert_eq!(rc, 3);
    assert_eq!(code.to_string(), "00200003");

    kernel.inject(Function::Send, Fault::Kernel {
        code: aci_proto::ErrorCode::from_text("00070007"),
        errtext: "SERVICE NOT REGISTERED".to_owned(),
    });
    let err = broker.send(Some(CONV_NEW), None).unwrap_err();
    let AciError::Broker { code, errtext, .. } = err else {
        unreachable!("kernel faults surface as broker errors");
    };
    assert_eq!(code.to_string(), "00070007");
    assert_eq!(errtext, "SERVICE NOT REGISTERED");

    broker.send(Some(CONV_NEW), None).unwrap();
    assert_eq!(kernel.count(Function::Send), 3);
}

#[test]
fn control_block_of_the_wrong_length_is_refused() {
    let kernel = SimKernel::new();
    let mut control = [0u8; 10];
    control[1] = 2;
    let rc = kernel.call(&mut control, &mut [], &mut [], &mut []);
    assert_eq!(rc, RC_BAD_CONTROL_BLOCK);
    assert!(kernel.calls().is_empty());
}

#[test]
fn version_calls_report_configured_levels() {
    let kernel = Arc::new(SimKernel::new().with_kernel_version("Version 10.5.0.0").with_api_version(8));
    let transport: Arc<dyn Transport> = kernel.clone();
    let config = SessionConfig { api_version: 10, ..SessionConfig::default() };
    let mut broker = Broker::new(&config, transport).unwrap();

    let stub = broker.version().unwrap();
    assert_eq!(stub, aci_harness::kernel::STUB_VERSION);
    assert_eq!(broker.control_block().version(), 8);

    let info = broker.kernel_version().unwrap();
    assert_eq!(info.version, "Version 10.5.0.0");
    assert_eq!(info.major(), Some(10));
    assert_eq!(info.max_message_size, 1_048_576);

    let calls = kernel.calls();
    assert_eq!(calls[0].len, 880);
    assert_eq!(calls[1].len, 756);
}
