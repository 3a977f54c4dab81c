//! Tests for the Keithley 2400 driver.

use std::io;

use rstest::*;

use footswitch_instrument::{Instrument, InstrumentError, LoopbackTransport};

use keithley_2400::*;

// Type alias for the loopback transport with the Keithley 2400 driver.
type Keithley2400Lbk = Instrument<Keithley2400<LoopbackTransport>>;

/// The setup sequence as the instrument receives it, without prefix and terminator.
const SETUP: [&str; 13] = [
    "SENS:VOLT:NPLC 10",
    "SOUR:CLE:AUTO ON",
    "ARM:COUN 1",
    "ARM:SOUR IMM",
    "TRIG:COUN 1",
    "TRIG:SOUR IMM",
    "SENS:AVER:TCON REP",
    "SENS:AVER:COUNT 10",
    "SENS:AVER OFF",
    "SENS:CURR:RANG:AUTO ON",
    "SENS:VOLT:RANG:AUTO ON",
    "SOUR:DEL 0.25",
    "SYST:LOC",
];

const RESPONSE: &str = "+1.000214E+00,+1.013420E-03,+9.910000E+37,+1.372500E+02,+1.980000E+04";

/// Function that creates a new Keithley 2400 instance with the given input and output commands.
///
/// The delay between commands is switched off to keep the tests fast.
fn crt_inst(host2inst: Vec<&str>, inst2host: Vec<&str>) -> Keithley2400Lbk {
    let transport = LoopbackTransport::new(host2inst, inst2host, "\n").with_prefix(":");
    crt_inst_with(transport)
}

fn crt_inst_with(transport: LoopbackTransport) -> Keithley2400Lbk {
    let mut inst = Keithley2400::with_transport(transport, "ws://keithley.lan:8000");
    inst.set_wait(None);
    inst
}

/// Commands sent by setup with prefix and terminator.
fn setup_wire() -> Vec<String> {
    SETUP.iter().map(|cmd| format!(":{cmd}\n")).collect()
}

#[fixture]
fn emp_inst() -> Keithley2400Lbk {
    crt_inst(vec![], vec![])
}

/// Empty initialization should always pass and not connect.
#[rstest]
fn test_initialization(emp_inst: Keithley2400Lbk) {
    assert!(!emp_inst.is_open());
    assert_eq!(emp_inst.driver().transport().opened(), 0);
}

#[rstest]
fn test_settings() {
    let inst = Keithley2400::with_transport(
        LoopbackTransport::new(Vec::<&str>::new(), vec![], "\n"),
        "ws://keithley.lan:8000",
    );
    assert_eq!(inst.resource(), "ws://keithley.lan:8000");
    assert_eq!(inst.channel(), 1);
    assert_eq!(inst.wait(), Some(std::time::Duration::from_millis(300)));
    assert_eq!(inst.cmd_prefix(), ":");
    assert_eq!(inst.read_termination(), "\n");
    assert_eq!(inst.write_termination(), "\n");
    assert_eq!(inst.driver().average_count(), DEFAULT_AVERAGE_COUNT);
    assert!(!inst.driver().filter_enabled());
    assert_eq!(inst.driver().transport().read_terminator(), "\n");
}

#[rstest]
fn test_setup() {
    let mut inst = crt_inst(SETUP.to_vec(), vec![]);

    inst.setup().unwrap();

    assert!(inst.is_configured());
    assert!(!inst.is_open());
    let transport = inst.driver().transport();
    assert_eq!(transport.sent(), setup_wire());
    assert_eq!(transport.sent().last().unwrap(), ":SYST:LOC\n");
    assert_eq!(transport.opened(), 1);
    assert_eq!(transport.closed(), 1);
    assert_eq!(transport.resources(), ["ws://keithley.lan:8000"]);
}

#[rstest]
fn test_setup_then_action() {
    let mut host2inst = SETUP.to_vec();
    host2inst.extend(["READ?", "SYST:LOC"]);
    let mut inst = crt_inst(host2inst, vec![RESPONSE]);

    inst.setup().unwrap();
    let result = inst.action().unwrap();

    assert_eq!(result, RESPONSE);
    assert!(!inst.is_open());
    let transport = inst.driver().transport();
    assert_eq!(&transport.sent()[13..], [":READ?\n", ":SYST:LOC\n"]);
    assert_eq!(transport.opened(), 2);
    assert_eq!(transport.closed(), 2);
}

/// Each action is its own connect, read, disconnect cycle.
#[rstest]
fn test_repeated_actions() {
    let mut host2inst = SETUP.to_vec();
    host2inst.extend(["READ?", "SYST:LOC", "READ?", "SYST:LOC"]);
    let mut inst = crt_inst(host2inst, vec!["+1.0", "+2.0"]);

    inst.setup().unwrap();
    assert_eq!(inst.action().unwrap(), "+1.0");
    assert_eq!(inst.action().unwrap(), "+2.0");

    let transport = inst.driver().transport();
    assert_eq!(transport.opened(), 3);
    assert_eq!(transport.closed(), 3);
}

#[rstest]
fn test_action_before_setup(mut emp_inst: Keithley2400Lbk) {
    assert!(matches!(
        emp_inst.action(),
        Err(InstrumentError::NotConfigured)
    ));
    assert_eq!(emp_inst.driver().transport().opened(), 0);
}

/// The driver's action itself does not check whether setup ran.
#[rstest]
fn test_driver_action_without_setup() {
    let mut inst = crt_inst(vec!["READ?", "SYST:LOC"], vec![RESPONSE]);
    let result = <Keithley2400<LoopbackTransport> as footswitch_instrument::Driver>::action(
        &mut inst,
    )
    .unwrap();
    assert_eq!(result, RESPONSE);
}

/// If the connection cannot be opened, the error arrives at the caller and nothing is sent.
#[rstest]
fn test_action_open_error() {
    let transport = LoopbackTransport::new(SETUP.to_vec(), vec![], "\n").with_prefix(":");
    let mut inst = crt_inst_with(transport);
    inst.setup().unwrap();

    let sent_before = inst.driver().transport().sent().len();
    *inst.driver_mut().transport_mut() = LoopbackTransport::new(Vec::<&str>::new(), vec![], "\n")
        .with_open_error(io::ErrorKind::ConnectionRefused);

    match inst.action() {
        Err(InstrumentError::Io(err)) => assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused),
        _ => panic!("Expected connection refused from action."),
    }
    assert_eq!(sent_before, 13);
    assert!(inst.driver().transport().sent().is_empty());
    assert!(!inst.is_open());
}

/// A failing command in the middle of setup ends the session anyway.
#[rstest]
fn test_setup_write_error() {
    let transport = LoopbackTransport::new(SETUP[..5].to_vec(), vec![], "\n")
        .with_prefix(":")
        .with_write_error_at(4, io::ErrorKind::ConnectionReset);
    let mut inst = crt_inst_with(transport);

    assert!(matches!(inst.setup(), Err(InstrumentError::Io(_))));
    assert!(!inst.is_configured());
    assert!(!inst.is_open());
    let transport = inst.driver().transport();
    assert_eq!(transport.sent().len(), 4);
    assert!(!transport.is_session_open());
}

#[rstest]
#[case(1)]
#[case(42)]
#[case(100)]
fn test_average_count(#[case] count: u32) {
    let count_cmd = format!("SENS:AVER:COUNT {count}");
    let mut host2inst = SETUP.to_vec();
    host2inst[7] = count_cmd.as_str();
    let mut inst = crt_inst(host2inst, vec![]);

    inst.driver_mut().set_average_count(count).unwrap();
    assert_eq!(inst.driver().average_count(), count);
    inst.setup().unwrap();
}

#[rstest]
#[case(0)]
#[case(101)]
fn test_average_count_out_of_range(mut emp_inst: Keithley2400Lbk, #[case] count: u32) {
    match emp_inst.driver_mut().set_average_count(count) {
        Err(InstrumentError::IntValueOutOfRange { value, min, max }) => {
            assert_eq!(value, i64::from(count));
            assert_eq!(min, 1);
            assert_eq!(max, 100);
        }
        _ => panic!("Expected IntValueOutOfRange error"),
    }
    assert_eq!(emp_inst.driver().average_count(), DEFAULT_AVERAGE_COUNT);
}

#[rstest]
fn test_filter_enabled() {
    let mut host2inst = SETUP.to_vec();
    host2inst[8] = "SENS:AVER ON";
    let mut inst = crt_inst(host2inst, vec![]);

    inst.driver_mut().set_filter_enabled(true);
    assert!(inst.driver().filter_enabled());
    inst.setup().unwrap();
}

#[rstest]
fn test_setup_commands(emp_inst: Keithley2400Lbk) {
    assert_eq!(emp_inst.driver().setup_commands(), SETUP);
}

#[rstest]
fn test_parse_reading() {
    let reading: Reading = RESPONSE.parse().unwrap();
    assert_eq!(reading.voltage().as_volts(), 1.000214);
    assert_eq!(reading.current().as_amperes(), 1.013420e-3);
    assert!(reading.resistance().is_none());
    assert_eq!(reading.timestamp(), 137.25);
    assert_eq!(reading.status(), 19800);
}

#[rstest]
fn test_parse_reading_with_resistance() {
    let reading: Reading = "+1.0E+00,+1.0E-03,+1.0E+03,+0.0E+00,+0.0E+00\n"
        .parse()
        .unwrap();
    assert_eq!(reading.resistance().unwrap().as_ohms(), 1000.0);
}

#[rstest]
#[case("")]
#[case("+1.0E+00")]
#[case("+1.0E+00,+1.0E-03,+9.91E+37,+1.0E+00")]
#[case("+1.0E+00,+1.0E-03,+9.91E+37,+1.0E+00,+1.0E+00,+1.0E+00")]
#[case("+1.0E+00,abc,+9.91E+37,+1.0E+00,+1.0E+00")]
#[case("+1.0E+00,+1.0E-03,+9.91E+37,+1.0E+00,-1.0E+00")]
#[case("+1.0E+00,+1.0E-03,+9.91E+37,+1.0E+00,nan")]
#[case("+1.0E+00,+1.0E-03,+9.91E+37,+1.0E+00,inf")]
#[case("+1.0E+00,+1.0E-03,+9.91E+37,+1.0E+00,+4.7E+00")]
fn test_parse_reading_malformed(#[case] response: &str) {
    match response.parse::<Reading>() {
        Err(InstrumentError::ResponseParseError(resp)) => assert_eq!(resp, response),
        _ => panic!("Expected ResponseParseError"),
    }
}
