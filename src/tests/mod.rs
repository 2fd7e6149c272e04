pub mod test_layers;
pub mod test_replay_buffer;
