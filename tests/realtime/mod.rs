mod call_tests;
mod message_tests;
mod presence_tests;
mod socket_tests;
