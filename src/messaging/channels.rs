// Communication channels lock-free
//
// Sized for look-ahead bursts: one loop is ~170 voices, and a toggle can
// push two loops before the audio callback drains the queue.

use crate::messaging::command::Command;
use crate::messaging::notification::Notification;
use ringbuf::{HeapRb, traits::Split};

pub const COMMAND_RINGBUFFER_CAPACITY: usize = 4096;
pub const NOTIFICATION_RINGBUFFER_CAPACITY: usize = 256;

pub type CommandProducer = ringbuf::HeapProd<Command>;
pub type CommandConsumer = ringbuf::HeapCons<Command>;

pub fn create_command_channel(capacity: usize) -> (CommandProducer, CommandConsumer) {
    HeapRb::<Command>::new(capacity).split()
}

pub type NotificationProducer = ringbuf::HeapProd<Notification>;
pub type NotificationConsumer = ringbuf::HeapCons<Notification>;

pub fn create_notification_channel(
    capacity: usize,
) -> (NotificationProducer, NotificationConsumer) {
    HeapRb::<Notification>::new(capacity).split()
}
