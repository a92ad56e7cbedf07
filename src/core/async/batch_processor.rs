//! Batch processing with machinery-based partitioning
//!
//! This module provides the `BatchProcessor` struct, which replays batches of
//! commands concurrently while keeping every machine's commands in order.
//!
//! # Design
//!
//! A batch is split into one sub-batch per machine. Each sub-batch runs
//! sequentially inside its own tokio task; sub-batches of different machines
//! run in parallel. Since bookings never span machines, this preserves the
//! outcome of a sequential replay.
//!
//! Booking IDs are the one thing machines share. When a batch creates the
//! same booking ID on two machines, it is cut into rounds at the later
//! create, so that create only runs once the earlier one has settled.
//!
//! # Architecture
//!
//! ```text
//! BatchProcessor
//!     └── AsyncBookingEngine  (shared, cheaply cloneable)
//! ```

use std::collections::HashMap;

use tracing::error;

use super::AsyncBookingEngine;
use crate::types::{Booking, BookingCommand, BookingError, BookingId, CommandAction, MachineryId};

/// Result of replaying a single command
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The command that was replayed
    pub command: BookingCommand,

    /// The booking after the command, or why it was refused
    pub result: Result<Booking, BookingError>,
}

/// Batch processor with machinery-based partitioning
#[derive(Debug, Clone)]
pub struct BatchProcessor {
    engine: AsyncBookingEngine,
}

impl BatchProcessor {
    /// Create a new BatchProcessor
    ///
    /// # Arguments
    ///
    /// * `engine` - Engine shared by every task spawned for a batch
    pub fn new(engine: AsyncBookingEngine) -> Self {
        Self { engine }
    }

    /// Partition a batch of commands by machinery ID
    ///
    /// # Guarantees
    ///
    /// - Each command appears in exactly one sub-batch
    /// - Commands for each machine keep their original order
    pub fn partition_by_machinery(
        &self,
        batch: Vec<BookingCommand>,
    ) -> HashMap<MachineryId, Vec<BookingCommand>> {
        let mut machine_batches: HashMap<MachineryId, Vec<BookingCommand>> = HashMap::new();

        for command in batch {
            machine_batches
                .entry(command.machinery)
                .or_default()
                .push(command);
        }

        machine_batches
    }

    /// Replay all commands for a single machine sequentially
    ///
    /// Failures are captured in the results and do not stop the replay.
    /// Results are in input order.
    pub async fn process_machinery_commands(
        &self,
        commands: Vec<BookingCommand>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(commands.len());

        for command in commands {
            let result = self.engine.apply(command.clone()).await;
            results.push(ProcessingResult { command, result });
        }

        results
    }

    /// Cut a batch into rounds that can each be partitioned by machinery
    ///
    /// A new round starts at every `create` whose booking ID was already
    /// created on another machine in the current round.
    ///
    /// # Guarantees
    ///
    /// - Rounds concatenate back to the original batch
    /// - Within a round, each booking ID is created on at most one machine
    pub fn split_rounds(&self, batch: Vec<BookingCommand>) -> Vec<Vec<BookingCommand>> {
        let mut rounds = Vec::new();
        let mut round: Vec<BookingCommand> = Vec::new();
        let mut creators: HashMap<BookingId, MachineryId> = HashMap::new();

        for command in batch {
            if let CommandAction::Create(request) = &command.action {
                let creator = *creators.entry(request.booking).or_insert(request.machinery);
                if creator != request.machinery {
                    rounds.push(std::mem::take(&mut round));
                    creators.clear();
                    creators.insert(request.booking, request.machinery);
                }
            }
            round.push(command);
        }

        if !round.is_empty() {
            rounds.push(round);
        }
        rounds
    }

    /// Replay a batch with machinery-based partitioning
    ///
    /// Rounds from [`BatchProcessor::split_rounds`] run one after another.
    /// Within a round, one tokio task per machine runs in parallel.
    /// Results of different machines may interleave in any order.
    pub async fn process_batch(&self, batch: Vec<BookingCommand>) -> Vec<ProcessingResult> {
        let mut results = Vec::new();
        for round in self.split_rounds(batch) {
            results.extend(self.process_round(round).await);
        }
        results
    }

    async fn process_round(&self, round: Vec<BookingCommand>) -> Vec<ProcessingResult> {
        let machine_batches = self.partition_by_machinery(round);

        let mut tasks = Vec::with_capacity(machine_batches.len());
        for (_machinery, commands) in machine_batches {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_machinery_commands(commands).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(machine_results) => results.extend(machine_results),
                Err(e) => error!("Replay task panicked: {:?}", e),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BookingEvent, BookingRequest, BookingStatus, CommandAction, Machinery};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn create(booking: u32, machinery: MachineryId, start: u32, end: u32) -> BookingCommand {
        BookingCommand {
            machinery,
            booking,
            action: CommandAction::Create(BookingRequest::new(
                booking,
                machinery,
                20,
                day(start),
                day(end),
            )),
        }
    }

    fn event(booking: u32, machinery: MachineryId, event: BookingEvent) -> BookingCommand {
        BookingCommand {
            machinery,
            booking,
            action: CommandAction::Transition(event),
        }
    }

    fn processor_with_fleet(machines: u32) -> BatchProcessor {
        let engine = AsyncBookingEngine::new();
        for id in 1..=machines {
            engine
                .register_machinery(Machinery::new(id, 10, "Tractor", 1000))
                .unwrap();
        }
        BatchProcessor::new(engine)
    }

    #[test]
    fn test_partition_by_machinery_keeps_order() {
        let processor = processor_with_fleet(2);
        let batch = vec![
            create(1, 1, 1, 2),
            create(2, 2, 1, 2),
            event(1, 1, BookingEvent::Approve),
            event(2, 2, BookingEvent::Approve),
            event(1, 1, BookingEvent::Start),
        ];

        let partitions = processor.partition_by_machinery(batch);

        assert_eq!(partitions.len(), 2);
        let machine_one: Vec<&str> = partitions[&1].iter().map(|c| c.kind()).collect();
        assert_eq!(machine_one, vec!["create", "approve", "start"]);
        assert_eq!(partitions[&2].len(), 2);
    }

    #[test]
    fn test_partition_empty_batch() {
        let processor = processor_with_fleet(1);
        assert!(processor.partition_by_machinery(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_process_machinery_commands_continues_after_error() {
        let processor = processor_with_fleet(1);
        let commands = vec![
            create(1, 1, 1, 3),
            create(2, 1, 2, 4), // overlaps booking 1
            event(1, 1, BookingEvent::Approve),
        ];

        let results = processor.process_machinery_commands(commands).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].result.is_ok());
        assert!(matches!(
            results[1].result,
            Err(BookingError::Unavailable { .. })
        ));
        assert_eq!(
            results[2].result.as_ref().unwrap().status,
            BookingStatus::Confirmed
        );
    }

    #[tokio::test]
    async fn test_process_batch_many_machines() {
        let processor = processor_with_fleet(20);
        let mut batch = Vec::new();
        for machinery in 1..=20 {
            batch.push(create(machinery, machinery, 1, 3));
            batch.push(event(machinery, machinery, BookingEvent::Approve));
        }

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 40);
        assert!(results.iter().all(|r| r.result.is_ok()));
        assert!(processor
            .engine
            .bookings()
            .iter()
            .all(|b| b.status == BookingStatus::Confirmed));
    }

    #[test]
    fn test_split_rounds_cuts_at_cross_machine_booking_id() {
        let processor = processor_with_fleet(2);
        let batch = vec![
            create(7, 1, 1, 2),
            create(8, 2, 1, 2),
            event(7, 1, BookingEvent::Approve),
            create(7, 2, 5, 6),
            create(7, 2, 8, 9), // same machine again, stays in the round
            event(8, 2, BookingEvent::Approve),
        ];

        let rounds = processor.split_rounds(batch);

        let sizes: Vec<usize> = rounds.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![3, 3]);
        assert_eq!(rounds[1][0].machinery, 2);
        assert_eq!(rounds[1][0].booking, 7);
    }

    #[test]
    fn test_split_rounds_keeps_plain_batch_whole() {
        let processor = processor_with_fleet(2);
        let batch = vec![create(1, 1, 1, 2), create(2, 2, 1, 2), event(1, 1, BookingEvent::Start)];

        assert_eq!(processor.split_rounds(batch).len(), 1);
        assert!(processor.split_rounds(Vec::new()).is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_first_create_in_batch_keeps_shared_booking_id() {
        for _ in 0..100 {
            let processor = processor_with_fleet(2);
            let batch = vec![create(7, 1, 1, 2), create(7, 2, 1, 2)];

            let results = processor.process_batch(batch).await;

            assert_eq!(processor.engine.booking(7).unwrap().machinery, 1);
            let refused: Vec<_> = results.iter().filter(|r| r.result.is_err()).collect();
            assert_eq!(refused.len(), 1);
            assert_eq!(refused[0].command.machinery, 2);
            assert!(matches!(
                refused[0].result,
                Err(BookingError::DuplicateBooking { .. })
            ));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_later_create_takes_id_when_earlier_one_is_refused() {
        let processor = processor_with_fleet(2);
        let batch = vec![
            create(1, 1, 1, 3),
            create(7, 1, 2, 2), // overlaps booking 1
            create(7, 2, 2, 2),
        ];

        let results = processor.process_batch(batch).await;

        assert_eq!(results.iter().filter(|r| r.result.is_ok()).count(), 2);
        assert_eq!(processor.engine.booking(7).unwrap().machinery, 2);
    }

    #[tokio::test]
    async fn test_process_batch_reports_every_command() {
        let processor = processor_with_fleet(2);
        let batch = vec![
            create(1, 1, 1, 3),
            event(9, 1, BookingEvent::Approve), // unknown booking
            create(2, 2, 5, 4),                 // reversed dates
            create(3, 2, 4, 5),
        ];

        let results = processor.process_batch(batch).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results.iter().filter(|r| r.result.is_err()).count(), 2);
    }
}
