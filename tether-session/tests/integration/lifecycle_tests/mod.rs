pub mod test_connect_failure;
pub mod test_notification_channel;
pub mod test_stop_discards_in_flight_answer;
