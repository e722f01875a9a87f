//! CSV export for run output.
//!
//! Three files, each with a fixed schema v1 header: the per-tick time
//! series, the swap event log, and the optional per-vehicle trace.
//! Output is deterministic for identical inputs.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::error::SimResult;
use crate::sim::types::{SwapEvent, TickSnapshot, VehicleTraceRow};

/// Schema v1 column header for the per-tick time series.
pub const SNAPSHOT_HEADER: &str = "tick,minute,total_running_minutes,queue_length,traveling,\
                                   pool_not_full,pool_ready,running,in_trip,\
                                   traveling_to_station,waiting,swapping";

/// Schema v1 column header for the swap event log.
pub const SWAP_HEADER: &str = "vehicle,decision_tick,arrival_tick,swap_tick,queue_wait_ticks,\
                               queue_length_at_decision,soc_at_decision,returned_battery,\
                               installed_battery,installed_charge";

/// Schema v1 column header for the per-vehicle trace.
pub const TRACE_HEADER: &str = "tick,vehicle,state,charge";

fn writer(path: &Path) -> io::Result<io::BufWriter<File>> {
    Ok(io::BufWriter::new(File::create(path)?))
}

fn header(wtr: &mut csv::Writer<impl Write>, columns: &str) -> csv::Result<()> {
    wtr.write_record(columns.split(',').map(str::trim))
}

/// Exports the per-tick time series to a CSV file at `path`.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_snapshots(snapshots: &[TickSnapshot], path: &Path) -> SimResult<()> {
    write_snapshots(snapshots, writer(path)?)
}

/// Writes the per-tick time series as CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_snapshots(snapshots: &[TickSnapshot], writer: impl Write) -> SimResult<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    header(&mut wtr, SNAPSHOT_HEADER)?;

    for s in snapshots {
        wtr.write_record(&[
            s.tick.to_string(),
            s.minute.to_string(),
            s.total_running_minutes.to_string(),
            s.queue_length.to_string(),
            s.traveling.to_string(),
            s.pool_not_full.to_string(),
            s.pool_ready.to_string(),
            s.running.to_string(),
            s.in_trip.to_string(),
            s.traveling_to_station.to_string(),
            s.waiting.to_string(),
            s.swapping.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the swap event log to a CSV file at `path`.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_swaps(swaps: &[SwapEvent], path: &Path) -> SimResult<()> {
    write_swaps(swaps, writer(path)?)
}

/// Writes the swap event log as CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_swaps(swaps: &[SwapEvent], writer: impl Write) -> SimResult<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    header(&mut wtr, SWAP_HEADER)?;

    for e in swaps {
        wtr.write_record(&[
            e.vehicle.0.to_string(),
            e.decision_tick.to_string(),
            e.arrival_tick.to_string(),
            e.swap_tick.to_string(),
            e.queue_wait_ticks().to_string(),
            e.queue_length_at_decision.to_string(),
            format!("{:.4}", e.soc_at_decision),
            e.returned_battery.0.to_string(),
            e.installed_battery.0.to_string(),
            format!("{:.4}", e.installed_charge),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Exports the per-vehicle trace to a CSV file at `path`.
///
/// # Errors
///
/// Returns an error if file creation or writing fails.
pub fn export_trace(trace: &[VehicleTraceRow], path: &Path) -> SimResult<()> {
    write_trace(trace, writer(path)?)
}

/// Writes the per-vehicle trace as CSV to any writer.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_trace(trace: &[VehicleTraceRow], writer: impl Write) -> SimResult<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    header(&mut wtr, TRACE_HEADER)?;

    for r in trace {
        wtr.write_record(&[
            r.tick.to_string(),
            r.vehicle.0.to_string(),
            r.state.as_str().to_string(),
            format!("{:.4}", r.charge),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fleet::types::{BatteryId, VehicleId, VehicleState};

    fn make_snapshot(t: usize) -> TickSnapshot {
        TickSnapshot {
            tick: t,
            minute: t as u64 + 1,
            total_running_minutes: 30 * t as u64,
            queue_length: 2,
            traveling: 1,
            pool_not_full: 3,
            pool_ready: 7,
            running: 10,
            in_trip: 25,
            traveling_to_station: 1,
            waiting: 2,
            swapping: 2,
        }
    }

    fn make_swap(t: usize) -> SwapEvent {
        SwapEvent {
            vehicle: VehicleId(3),
            decision_tick: t,
            arrival_tick: t + 10,
            swap_tick: t + 14,
            queue_length_at_decision: 1,
            soc_at_decision: 30.0,
            returned_battery: BatteryId(3),
            installed_battery: BatteryId(41),
            installed_charge: 100.0,
        }
    }

    fn lines(buf: Vec<u8>) -> Vec<String> {
        String::from_utf8(buf)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn snapshot_header_matches_schema_v1() {
        let mut buf = Vec::new();
        write_snapshots(&[make_snapshot(0)], &mut buf).ok();
        assert_eq!(
            lines(buf).first().map(String::as_str),
            Some(
                "tick,minute,total_running_minutes,queue_length,traveling,\
                 pool_not_full,pool_ready,running,in_trip,\
                 traveling_to_station,waiting,swapping"
            )
        );
    }

    #[test]
    fn row_count_matches_tick_count() {
        let snapshots: Vec<TickSnapshot> = (0..24).map(make_snapshot).collect();
        let mut buf = Vec::new();
        write_snapshots(&snapshots, &mut buf).ok();
        // 1 header + 24 data rows
        assert_eq!(lines(buf).len(), 25);
    }

    #[test]
    fn swap_rows_include_queue_wait() {
        let mut buf = Vec::new();
        write_swaps(&[make_swap(30)], &mut buf).ok();
        let mut rdr = csv::ReaderBuilder::new().from_reader(buf.as_slice());
        assert_eq!(rdr.headers().map(csv::StringRecord::len).ok(), Some(10));
        let rec = rdr.records().next().and_then(Result::ok);
        assert_eq!(rec.as_ref().and_then(|r| r.get(4)), Some("4"));
        assert_eq!(rec.as_ref().and_then(|r| r.get(8)), Some("41"));
    }

    #[test]
    fn trace_uses_state_names() {
        let trace = vec![
            VehicleTraceRow {
                tick: 0,
                vehicle: VehicleId(0),
                state: VehicleState::InTrip,
                charge: 100.0,
            },
            VehicleTraceRow {
                tick: 0,
                vehicle: VehicleId(1),
                state: VehicleState::TravelingToStation,
                charge: 30.0,
            },
        ];
        let mut buf = Vec::new();
        write_trace(&trace, &mut buf).ok();
        let out = lines(buf);
        assert_eq!(out.len(), 3);
        assert_eq!(out[1], "0,0,in_trip,100.0000");
        assert_eq!(out[2], "0,1,traveling_to_station,30.0000");
    }

    #[test]
    fn deterministic_output() {
        let snapshots: Vec<TickSnapshot> = (0..5).map(make_snapshot).collect();
        let mut buf1 = Vec::new();
        let mut buf2 = Vec::new();
        write_snapshots(&snapshots, &mut buf1).ok();
        write_snapshots(&snapshots, &mut buf2).ok();
        assert_eq!(buf1, buf2);
    }
}
