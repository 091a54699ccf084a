pub mod messages_tests;
