use super::*;
use contracts::SCHEMA_VERSION_V1;

fn mix_replay_hash(current: u64, event_id: &str, tick: u64, sequence: u64) -> u64 {
    let mut hash = current ^ tick.wrapping_mul(0xA24B_1C62_5B93_2D47);
    hash ^= sequence.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    for byte in event_id.as_bytes() {
        hash = hash.rotate_left(7) ^ u64::from(*byte);
        hash = hash.wrapping_mul(0x517C_C1B7_2722_0A95);
    }
    hash
}

impl VeinWorld {
    pub(super) fn push_event(
        &mut self,
        event_type: EventType,
        agent_id: Option<&str>,
        region_id: Option<RegionId>,
        position: Option<Position>,
        caused_by: Vec<String>,
        details: Option<Value>,
    ) -> String {
        let tick = self.status.current_tick;
        self.sequence_in_tick = self.sequence_in_tick.saturating_add(1);
        let event_id = format!("evt_{tick:06}_{:04}", self.sequence_in_tick);
        self.event_log.push(Event {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: self.status.run_id.clone(),
            tick,
            event_id: event_id.clone(),
            sequence_in_tick: self.sequence_in_tick,
            event_type,
            agent_id: agent_id.map(str::to_string),
            region_id,
            position,
            caused_by,
            details,
        });
        self.event_index_by_id
            .insert(event_id.clone(), self.event_log.len().saturating_sub(1));
        self.replay_hash =
            mix_replay_hash(self.replay_hash, &event_id, tick, self.sequence_in_tick);
        event_id
    }
}
