//! Connection Tests
//!
//! Drives `PatliteControl` through an in-memory device that records every
//! transport call.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use patlite::network::{Connector, TcpConnector, Transport};
use patlite::protocol::{
    BuzzerState, Command, LedState, Mode, PhnFlags, RunControlData, PNS_ACK, PNS_NAK,
};
use patlite::{Config, ConnectionState, PatliteControl, PatliteError};

// =============================================================================
// Device Double
// =============================================================================

#[derive(Debug, Default)]
struct DeviceLog {
    connects: usize,
    closes: usize,
    sent: Vec<Vec<u8>>,
    recv_sizes: Vec<usize>,
    replies: VecDeque<io::Result<Vec<u8>>>,
}

#[derive(Clone, Default)]
struct FakeConnector {
    log: Rc<RefCell<DeviceLog>>,
    refuse: bool,
}

impl FakeConnector {
    fn reply(&self, bytes: &[u8]) {
        self.log.borrow_mut().replies.push_back(Ok(bytes.to_vec()));
    }

    fn fail_next_read(&self) {
        self.log
            .borrow_mut()
            .replies
            .push_back(Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset")));
    }
}

struct FakeTransport {
    log: Rc<RefCell<DeviceLog>>,
}

impl Connector for FakeConnector {
    type Transport = FakeTransport;

    fn connect(&mut self, _config: &Config) -> io::Result<FakeTransport> {
        self.log.borrow_mut().connects += 1;
        if self.refuse {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused"));
        }
        Ok(FakeTransport {
            log: Rc::clone(&self.log),
        })
    }
}

impl Transport for FakeTransport {
    fn send(&mut self, frame: &[u8]) -> io::Result<()> {
        self.log.borrow_mut().sent.push(frame.to_vec());
        Ok(())
    }

    fn recv(&mut self, max: usize) -> io::Result<Bytes> {
        let mut log = self.log.borrow_mut();
        log.recv_sizes.push(max);
        match log.replies.pop_front() {
            Some(Ok(bytes)) => Ok(Bytes::from(bytes)),
            Some(Err(e)) => Err(e),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no reply queued")),
        }
    }

    fn close(&mut self) -> io::Result<()> {
        self.log.borrow_mut().closes += 1;
        Ok(())
    }
}

fn control(connector: &FakeConnector) -> PatliteControl<FakeConnector> {
    let config = Config::new("192.168.10.1", 10000).unwrap();
    PatliteControl::with_connector(config, connector.clone())
}

// =============================================================================
// Construction
// =============================================================================

#[test]
fn test_invalid_address_fails_before_connect() {
    let connector = FakeConnector::default();

    let result = Config::new("999.1.1.1", 10000)
        .map(|config| PatliteControl::with_connector(config, connector.clone()));

    match result {
        Err(e) => {
            assert!(e.is_configuration());
            assert!(matches!(e, PatliteError::InvalidAddress(_)));
        }
        Ok(_) => panic!("Expected invalid address"),
    }
    assert_eq!(connector.log.borrow().connects, 0);
}

#[test]
fn test_tcp_facade_rejects_bad_input() {
    assert!(matches!(
        PatliteControl::new("999.1.1.1", 10000),
        Err(PatliteError::InvalidAddress(_))
    ));
    assert!(matches!(
        PatliteControl::new("192.168.10.1", 70000),
        Err(PatliteError::InvalidPort(70000))
    ));
    assert!(matches!(
        PatliteControl::new("::1", 10000),
        Err(PatliteError::InvalidAddress(_))
    ));
}

#[test]
fn test_construction_does_no_io() {
    let connector = FakeConnector::default();
    let ctl = control(&connector);

    assert_eq!(ctl.state(), ConnectionState::Unopened);
    assert_eq!(connector.log.borrow().connects, 0);
}

// =============================================================================
// State Machine
// =============================================================================

#[test]
fn test_send_before_open_is_not_connected() {
    let connector = FakeConnector::default();
    let mut ctl = control(&connector);

    let result = ctl.send_command(&Command::clear());
    assert!(matches!(result, Err(PatliteError::NotConnected)));
    assert!(connector.log.borrow().sent.is_empty());
}

#[test]
fn test_send_after_close_is_not_connected() {
    let connector = FakeConnector::default();
    let mut ctl = control(&connector);

    ctl.open().unwrap();
    ctl.close().unwrap();

    assert_eq!(ctl.state(), ConnectionState::Closed);
    assert!(matches!(
        ctl.send_command(&Command::clear()),
        Err(PatliteError::NotConnected)
    ));
    assert!(matches!(ctl.open(), Err(PatliteError::NotConnected)));
}

#[test]
fn test_open_twice() {
    let connector = FakeConnector::default();
    let mut ctl = control(&connector);

    ctl.open().unwrap();
    assert!(matches!(ctl.open(), Err(PatliteError::NotConnected)));

    // The first transport is kept
    assert_eq!(ctl.state(), ConnectionState::Open);
    assert_eq!(connector.log.borrow().connects, 1);
    assert_eq!(connector.log.borrow().closes, 0);
}

#[test]
fn test_close_happens_once() {
    let connector = FakeConnector::default();
    {
        let mut ctl = control(&connector);
        ctl.open().unwrap();
        ctl.close().unwrap();
        ctl.close().unwrap();
    }

    let log = connector.log.borrow();
    assert_eq!(log.connects, 1);
    assert_eq!(log.closes, 1);
}

#[test]
fn test_drop_closes_open_transport() {
    let connector = FakeConnector::default();
    {
        let mut ctl = control(&connector);
        ctl.open().unwrap();
    }
    assert_eq!(connector.log.borrow().closes, 1);
}

#[test]
fn test_refused_connection_is_transport_error() {
    let connector = FakeConnector {
        refuse: true,
        ..FakeConnector::default()
    };
    let mut ctl = control(&connector);

    assert!(matches!(ctl.open(), Err(PatliteError::Transport(_))));
    assert_eq!(ctl.state(), ConnectionState::Unopened);
}

// =============================================================================
// Sessions
// =============================================================================

#[test]
fn test_session_closes_on_success() {
    let connector = FakeConnector::default();
    connector.reply(&[PNS_ACK]);
    let mut ctl = control(&connector);

    let response = ctl
        .session(|ctl| {
            assert_eq!(ctl.state(), ConnectionState::Open);
            ctl.send_command(&Command::clear())
        })
        .unwrap();

    assert!(!response.is_negative_ack());
    assert_eq!(ctl.state(), ConnectionState::Closed);
    assert_eq!(connector.log.borrow().closes, 1);
}

#[test]
fn test_session_closes_on_error() {
    let connector = FakeConnector::default();
    connector.fail_next_read();
    let mut ctl = control(&connector);

    let result = ctl.session(|ctl| ctl.send_command(&Command::clear()));

    assert!(matches!(result, Err(PatliteError::Transport(_))));
    assert_eq!(ctl.state(), ConnectionState::Closed);
    assert_eq!(connector.log.borrow().closes, 1);
}

#[test]
fn test_session_closes_on_panic() {
    let connector = FakeConnector::default();
    let mut ctl = control(&connector);

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        let _ = ctl.session(|_| -> patlite::Result<()> { panic!("caller bug") });
    }));

    assert!(outcome.is_err());
    assert_eq!(ctl.state(), ConnectionState::Closed);
    assert_eq!(connector.log.borrow().closes, 1);
}

// =============================================================================
// Round Trips
// =============================================================================

#[test]
fn test_send_command_single_write_and_read() {
    let connector = FakeConnector::default();
    connector.reply(&[PNS_ACK]);
    let mut ctl = control(&connector);
    ctl.open().unwrap();

    let data = RunControlData::new([LedState::On; 5], BuzzerState::Pattern1);
    let response = ctl.send_command(&Command::run_control(data)).unwrap();
    assert!(!response.is_negative_ack());

    let log = connector.log.borrow();
    assert_eq!(log.sent, vec![b"ABS\x00\x00\x06\x01\x01\x01\x01\x01\x01".to_vec()]);
    assert_eq!(log.recv_sizes, vec![1024]);
}

#[test]
fn test_negative_ack_is_not_an_error() {
    let connector = FakeConnector::default();
    connector.reply(&[PNS_NAK]);
    let mut ctl = control(&connector);
    ctl.open().unwrap();

    let response = ctl.send_command(&Command::clear()).unwrap();
    assert!(response.is_negative_ack());
}

#[test]
fn test_recv_buffer_size_is_configurable() {
    let connector = FakeConnector::default();
    connector.reply(b"ACK");
    let config = Config::builder()
        .address("10.0.0.7")
        .port(10000)
        .recv_buffer_size(64)
        .build()
        .unwrap();
    let mut ctl = PatliteControl::with_connector(config, connector.clone());
    ctl.open().unwrap();

    let response = ctl.send_command(&Command::write(PhnFlags::LED_UNIT2_LIGHTING)).unwrap();
    assert!(!response.is_negative_ack());

    let log = connector.log.borrow();
    assert_eq!(log.sent, vec![vec![b'W', 0x02]]);
    assert_eq!(log.recv_sizes, vec![64]);
}

#[test]
fn test_get_status_typed() {
    let connector = FakeConnector::default();
    let mut reply = vec![0x00; 8];
    reply.push(0x01);
    reply.extend_from_slice(&[5, 1, 0, 3]);
    connector.reply(&reply);
    let mut ctl = control(&connector);

    let status = ctl.session(|ctl| ctl.get_status()).unwrap();

    assert_eq!(status.mode(), Mode::Smart);
    assert_eq!(status.smart_mode_data().unwrap().group_no, 5);
    assert_eq!(connector.log.borrow().sent, vec![b"ABG\x00\x00\x00".to_vec()]);
}

#[test]
fn test_short_status_reply_is_protocol_error() {
    let connector = FakeConnector::default();
    connector.reply(&[0x00; 10]);
    let mut ctl = control(&connector);

    let result = ctl.session(|ctl| ctl.get_status());
    assert!(matches!(result, Err(PatliteError::Protocol(_))));
}

#[test]
fn test_read_state_typed() {
    let connector = FakeConnector::default();
    connector.reply(&[0x05]);
    let mut ctl = control(&connector);

    let read = ctl.session(|ctl| ctl.read_state()).unwrap();

    assert!(read.flags().contains(PhnFlags::LED_UNIT1_LIGHTING));
    assert!(read.flags().contains(PhnFlags::LED_UNIT3_LIGHTING));
    assert_eq!(connector.log.borrow().sent, vec![b"R".to_vec()]);
}

#[test]
fn test_get_detail_status_typed() {
    let connector = FakeConnector::default();
    let mut reply = vec![0x00, 0x1A, 0x2B, 0x3C, 0x4D, 0x5E];
    reply.extend_from_slice(&[0; 8]);
    reply.push(0x00);
    reply.extend_from_slice(&[0; 4]);
    for stage in 0..5u8 {
        reply.extend_from_slice(&[1, stage, 0, 255]);
    }
    reply.push(2);
    assert_eq!(reply.len(), 40);
    connector.reply(&reply);
    let mut ctl = control(&connector);

    let detail = ctl.session(|ctl| ctl.get_detail_status()).unwrap();

    assert_eq!(detail.mode(), Mode::Led);
    assert_eq!(detail.mac_address().to_string(), "00:1a:2b:3c:4d:5e");
    let led = detail.led_mode_detail_data().unwrap();
    assert_eq!(led.led_units[4].red, 4);
    assert_eq!(led.buzzer_pattern, 2);
    assert_eq!(connector.log.borrow().sent, vec![b"ABE\x00\x00\x00".to_vec()]);
}

#[test]
fn test_get_detail_status_smart_mode_typed() {
    let connector = FakeConnector::default();
    let mut reply = vec![0x11; 6];
    reply.extend_from_slice(&[0; 8]);
    reply.push(0x01);
    reply.extend_from_slice(&[0; 4]);
    reply.extend_from_slice(&[7, 0, 1, 2, 3]);
    reply.extend_from_slice(&[0; 20]);
    reply.push(5);
    assert_eq!(reply.len(), 45);
    connector.reply(&reply);
    let mut ctl = control(&connector);

    let detail = ctl.session(|ctl| ctl.get_detail_status()).unwrap();

    let smart = detail.smart_mode_detail_data().unwrap();
    assert_eq!(smart.smart_mode.group_no, 7);
    assert_eq!(smart.smart_mode.last_pattern, 3);
    assert_eq!(smart.buzzer_pattern, 5);
}

// =============================================================================
// Logging
// =============================================================================

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl CapturedLog {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn with_trace_capture(f: impl FnOnce()) -> String {
    let captured = CapturedLog::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, f);
    captured.contents()
}

#[test]
fn test_reboot_frame_trace_omits_password() {
    let connector = FakeConnector::default();
    connector.reply(&[PNS_ACK]);
    let mut ctl = control(&connector);

    let output = with_trace_capture(|| {
        ctl.session(|ctl| ctl.send_command(&Command::reboot("secret").unwrap()))
            .unwrap();
    });

    // "secret" as hex
    assert!(!output.contains("73 65 63 72 65 74"), "{}", output);
    assert!(!output.contains("secret"), "{}", output);
    assert!(output.contains("41 42 42 00 00 06"), "{}", output);
    assert!(output.contains("6 bytes redacted"), "{}", output);

    // The device still receives the password
    assert_eq!(connector.log.borrow().sent, vec![b"ABB\x00\x00\x06secret".to_vec()]);
}

#[test]
fn test_control_frame_trace_is_full_hex() {
    let connector = FakeConnector::default();
    connector.reply(b"ACK");
    let mut ctl = control(&connector);

    let output = with_trace_capture(|| {
        ctl.session(|ctl| ctl.send_command(&Command::write(PhnFlags::BUZZER_PATTERN1)))
            .unwrap();
    });

    assert!(output.contains("-> Write [57 08]"), "{}", output);
    assert!(output.contains("<- Write [41 43 4b]"), "{}", output);
}

// =============================================================================
// TCP Transport
// =============================================================================

/// One-connection loopback device; `serve` gets the accepted stream and the
/// request it read
fn loopback_device<F>(serve: F) -> (Config, JoinHandle<Vec<u8>>)
where
    F: FnOnce(&mut TcpStream) + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = [0u8; 64];
        let n = stream.read(&mut buf).unwrap();
        serve(&mut stream);
        buf[..n].to_vec()
    });

    let config = Config::builder()
        .address("127.0.0.1")
        .port(u32::from(port))
        .read_timeout_ms(2000)
        .write_timeout_ms(2000)
        .build()
        .unwrap();
    (config, handle)
}

#[test]
fn test_tcp_nak_round_trip() {
    let (config, device) = loopback_device(|stream| {
        stream.write_all(&[PNS_NAK]).unwrap();
    });
    let mut ctl = PatliteControl::from_config(config);

    let response = ctl.session(|ctl| ctl.send_command(&Command::clear())).unwrap();

    assert!(response.is_negative_ack());
    assert_eq!(ctl.state(), ConnectionState::Closed);
    assert_eq!(device.join().unwrap(), b"ABC\x00\x00\x00");
}

#[test]
fn test_tcp_phn_read_round_trip() {
    let (config, device) = loopback_device(|stream| {
        stream.write_all(&[0x2A]).unwrap();
    });
    let mut ctl = PatliteControl::from_config(config);

    let read = ctl.session(|ctl| ctl.read_state()).unwrap();

    assert_eq!(read.flags().bits(), 0x2A);
    assert_eq!(device.join().unwrap(), b"R");
}

#[test]
fn test_tcp_peer_closes_before_reply() {
    let (config, device) = loopback_device(|_| {});
    let mut ctl = PatliteControl::from_config(config);

    let result = ctl.session(|ctl| ctl.send_command(&Command::clear()));

    assert!(matches!(result, Err(PatliteError::Transport(_))));
    assert_eq!(ctl.state(), ConnectionState::Closed);
    device.join().unwrap();
}

#[test]
fn test_tcp_split_reply_is_single_read() {
    let (config, device) = loopback_device(|stream| {
        let mut reply = vec![0x00; 8];
        reply.push(0x01);
        reply.extend_from_slice(&[5, 1, 0, 3]);
        stream.write_all(&reply[..5]).unwrap();
        stream.flush().unwrap();
        thread::sleep(Duration::from_millis(300));
        // The client may already be gone
        let _ = stream.write_all(&reply[5..]);
    });
    let mut ctl = PatliteControl::from_config(config);

    // Only the first chunk is read; the status parser rejects it
    let result = ctl.session(|ctl| ctl.get_status());

    assert!(matches!(result, Err(PatliteError::Protocol(_))));
    device.join().unwrap();
}

#[test]
fn test_tcp_read_timeout_is_transport_error() {
    let (config, device) = loopback_device(|_| thread::sleep(Duration::from_millis(500)));
    let config = Config {
        read_timeout_ms: 50,
        ..config
    };
    let mut ctl = PatliteControl::from_config(config);

    let result = ctl.session(|ctl| ctl.send_command(&Command::clear()));

    match result {
        Err(PatliteError::Transport(e)) => assert!(matches!(
            e.kind(),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
        )),
        other => panic!("Expected timeout, got {:?}", other),
    }
    device.join().unwrap();
}

#[test]
fn test_tcp_transport_direct() {
    let (config, device) = loopback_device(|stream| {
        stream.write_all(b"ACK").unwrap();
    });

    let mut transport = TcpConnector.connect(&config).unwrap();
    assert_eq!(transport.peer_addr(), config.socket_addr().to_string());

    transport.send(b"W\x01").unwrap();
    let reply = transport.recv(1024).unwrap();
    assert_eq!(&reply[..], b"ACK");

    assert_eq!(device.join().unwrap(), b"W\x01");

    // Peer is gone; a second read sees end of stream
    let eof = transport.recv(1024).unwrap_err();
    assert_eq!(eof.kind(), io::ErrorKind::UnexpectedEof);

    transport.close().unwrap();
    transport.close().unwrap();
}

#[test]
fn test_tcp_connect_refused_is_transport_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let mut ctl = PatliteControl::new("127.0.0.1", u32::from(port)).unwrap();

    assert!(matches!(ctl.open(), Err(PatliteError::Transport(_))));
    assert_eq!(ctl.state(), ConnectionState::Unopened);
}
