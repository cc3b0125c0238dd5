use tracing_json_formatter::{
    ErrorInfo, FieldValue, JsonFormatter, JsonFormatterConfig, Level, LogRecord, Message,
    RecordFormatter,
};

#[derive(Debug)]
struct PaymentDeclined;

impl std::fmt::Display for PaymentDeclined {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("card declined by issuer")
    }
}

impl std::error::Error for PaymentDeclined {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let formatter = JsonFormatter::new(
        JsonFormatterConfig::default()
            .with_field("level", "levelname")
            .with_field("time", "asctime")
            .with_field("service", "billing"),
    )?;

    let plain = LogRecord::new(Level::Info, "bare message");
    println!("{}", JsonFormatter::default().format(&plain));

    let with_args = LogRecord::new(
        Level::Info,
        Message::with_args("charged {} cents", vec![FieldValue::from(1250)]),
    )
    .with_extra("customer", "c-42");
    println!("{}", formatter.format(&with_args));

    let structured = LogRecord::new(
        Level::Warning,
        Message::structured([("event", FieldValue::from("retry")), ("attempt", FieldValue::from(3))]),
    );
    println!("{}", formatter.format(&structured));

    let failed = LogRecord::new(Level::Error, "payment failed")
        .with_error(ErrorInfo::from_error(&PaymentDeclined));
    println!("{}", formatter.format(&failed));

    Ok(())
}
