//! Output formatting module

use serde::Serialize;
use truckgate_app::app::{AdmittedTruck, IntakeReceipt};
use truckgate_types::{AudioArtifactRef, OutputFormat, PlateReading, Result, TruckRecord};

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn output_receipt(output_format: OutputFormat, receipt: &IntakeReceipt) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(receipt);
    }

    println!("Truck {} registered (record {})", receipt.truck_number, receipt.id);
    if let PlateReading::Unrecognized { raw } = &receipt.reading {
        println!("Plate not readable, queued as UNKNOWN (response: {:?})", raw);
    }
    println!("Plate:    {}", receipt.plate_path.display());
    println!("License:  {}", receipt.license_path.display());
    println!("Challan:  {}", receipt.challan_path.display());
    Ok(())
}

pub fn output_reading(output_format: OutputFormat, reading: &PlateReading) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(reading);
    }

    match reading {
        PlateReading::Recognized { plate } => println!("Plate number: {}", plate),
        PlateReading::Unrecognized { raw } => {
            println!("Plate number: {} (no plate in {:?})", reading.truck_number(), raw)
        }
    }
    Ok(())
}

pub fn output_admission(output_format: OutputFormat, admitted: Option<&AdmittedTruck>) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(&admitted);
    }

    match admitted {
        Some(truck) => {
            println!("Truck {} admitted (record {})", truck.truck_number, truck.id);
            println!("Announcement: {}", truck.artifact.path.display());
        }
        None => println!("Queue empty"),
    }
    Ok(())
}

pub fn output_artifact(output_format: OutputFormat, artifact: &AudioArtifactRef) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(artifact);
    }
    println!("{}", artifact.path.display());
    Ok(())
}

pub fn output_records(output_format: OutputFormat, title: &str, records: &[TruckRecord]) -> Result<()> {
    if output_format == OutputFormat::Json {
        return print_json(records);
    }

    println!("\n{} ({})", title, records.len());
    println!("{}", "=".repeat(title.len()));
    if records.is_empty() {
        println!("(none)");
        return Ok(());
    }

    println!(
        "{:>6}  {:<14}  {:<8}  {:<19}  {:<19}",
        "ID", "Truck", "Status", "Registered", "Entered"
    );
    for record in records {
        let entered = record
            .entered_at
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>6}  {:<14}  {:<8}  {:<19}  {:<19}",
            record.id.to_string(),
            record.truck_number,
            record.status.as_str(),
            record
                .created_at
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string(),
            entered
        );
    }
    Ok(())
}
