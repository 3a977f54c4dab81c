use std::io;

use clap::Parser;
use eyre::WrapErr;
use log::{debug, info};

use footswitch::{
    Button, ButtonSource, Footswitch, KeyboardButtons,
    config::{Args, InputKind, TransportKind},
};
#[cfg(feature = "gpio")]
use footswitch::GpioButtons;
#[cfg(feature = "serial")]
use footswitch_instrument::SerialTransport;
use footswitch_instrument::{Instrument, TcpIpTransport, Transport};
use keithley_2400::{Keithley2400, Reading};

fn main() -> eyre::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    info!(
        "Keithley 2400 at {} via {:?}, buttons from {:?}",
        args.resource, args.transport, args.input
    );

    match args.transport {
        TransportKind::Websocket => run(Keithley2400::websocket(&args.resource), &args),
        TransportKind::Tcp => run(
            Keithley2400::with_transport(TcpIpTransport::new(), &args.resource),
            &args,
        ),
        #[cfg(feature = "serial")]
        TransportKind::Serial => run(
            Keithley2400::with_transport(SerialTransport::new(args.baud_rate), &args.resource),
            &args,
        ),
    }
}

/// Configure the SourceMeter, then serve button presses until the input ends.
fn run<T: Transport>(mut inst: Instrument<Keithley2400<T>>, args: &Args) -> eyre::Result<()> {
    inst.driver_mut().set_average_count(args.average_count)?;
    inst.driver_mut().set_filter_enabled(args.filter);
    if let Some(wait) = args.wait() {
        inst.set_wait(Some(wait));
    }

    inst.setup()
        .wrap_err_with(|| format!("Could not set up the instrument at {}", args.resource))?;

    let mut footswitch = Footswitch::new(args.poll_interval());
    footswitch.on(Button::A, move || {
        let line = inst.action()?;
        println!("{}", line.trim_end());
        match line.parse::<Reading>() {
            Ok(reading) => info!("Reading: {reading}"),
            Err(err) => debug!("{err}"),
        }
        Ok(())
    });
    footswitch.on(Button::B, || {
        println!("Button B!");
        Ok(())
    });

    let mut source: Box<dyn ButtonSource> = match args.input {
        #[cfg(feature = "gpio")]
        InputKind::Gpio => Box::new(
            GpioButtons::open(&args.gpio_chip)
                .wrap_err_with(|| format!("Could not open {}", args.gpio_chip))?,
        ),
        InputKind::Keyboard => Box::new(KeyboardButtons::new(io::stdin().lock())),
    };
    footswitch.run(source.as_mut())?;

    Ok(())
}
