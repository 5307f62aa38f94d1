pub mod gradebook;
