//! Bring-up of several boards at once.
//!
//! Boards share nothing, so each one is initialized and calibrated on its own
//! blocking worker while the caller awaits all of them.

use crate::board::adc16::calibrate::BoardCalibration;
use crate::board::adc16::{Adc16, AdcConfig};
use crate::Result;
use adc16_globals::RegisterBus;

/// A board handed back after its calibration run.
pub struct BoardReport<B> {
    pub board: Adc16<B>,
    pub result: Result<BoardCalibration>,
}

/// Initialize and calibrate every board with `config`.
///
/// Reports come back in the order the boards were given. A failing board
/// does not affect the others.
pub async fn calibrate_boards<B>(boards: Vec<Adc16<B>>, config: AdcConfig) -> Vec<BoardReport<B>>
where
    B: RegisterBus + Send + 'static,
{
    let workers: Vec<_> = boards
        .into_iter()
        .enumerate()
        .map(|(i, mut board)| {
            tokio::task::spawn_blocking(move || {
                log::info!("board {i}: starting calibration");
                let result = board
                    .initialize(&config)
                    .and_then(|()| board.calibrate_all_chips(&config));
                match &result {
                    Ok(report) if report.is_complete() => log::info!("board {i}: calibrated"),
                    Ok(report) => log::warn!("board {i}: {} chip(s) failed", report.failed.len()),
                    Err(e) => log::error!("board {i}: {e}"),
                }
                BoardReport { board, result }
            })
        })
        .collect();

    let mut reports = Vec::with_capacity(workers.len());
    for worker in workers {
        match worker.await {
            Ok(report) => reports.push(report),
            // workers are never aborted, so a join error is a panic
            Err(e) => std::panic::resume_unwind(e.into_panic()),
        }
    }
    reports
}
