use keithley_2400::{Keithley2400, Reading};

fn main() {
    let resource = "ws://wifi-uart.lan:8000";

    // Get our instrument behind the WebSocket bridge. Nothing is connected yet.
    let mut inst = Keithley2400::websocket(resource);

    // Average over 20 readings instead of the default 10, then configure the SourceMeter.
    inst.driver_mut().set_average_count(20).unwrap();
    inst.setup().unwrap();

    // Take five readings, each one in its own session.
    for _ in 0..5 {
        let line = inst.action().unwrap();
        match line.parse::<Reading>() {
            Ok(reading) => println!("{reading}"),
            Err(_) => println!("Raw response: {}", line.trim_end()),
        }
    }
}
