//! Generation-stamped page-load watchdog.
//!
//! The host never owns a timer. Arming yields a [`WatchdogTicket`]; the surface schedules its own
//! timer and hands the ticket back when it elapses. Only the ticket of the current arming fires,
//! and only once.

/// Token identifying one arming of the [`LoadWatchdog`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WatchdogTicket {
	generation: u64,
}
impl WatchdogTicket {
	/// Arming generation this ticket belongs to.
	pub fn generation(self) -> u64 {
		self.generation
	}
}

/// Single-fire load watchdog.
#[derive(Debug, Default)]
pub struct LoadWatchdog {
	generation: u64,
	armed: Option<WatchdogTicket>,
}
impl LoadWatchdog {
	/// Arms the watchdog, invalidating any ticket handed out before.
	pub fn arm(&mut self) -> WatchdogTicket {
		self.generation = self.generation.wrapping_add(1);

		let ticket = WatchdogTicket { generation: self.generation };

		self.armed = Some(ticket);

		ticket
	}

	/// Disarms the watchdog. Returns `true` if it was armed.
	pub fn disarm(&mut self) -> bool {
		self.armed.take().is_some()
	}

	/// Consumes `ticket` if it matches the current arming.
	pub fn fire(&mut self, ticket: WatchdogTicket) -> bool {
		if self.armed != Some(ticket) {
			return false;
		}

		self.armed = None;

		true
	}

	/// Returns `true` while a ticket is outstanding.
	pub fn is_armed(&self) -> bool {
		self.armed.is_some()
	}
}
