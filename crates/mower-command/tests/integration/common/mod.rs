pub mod mock_control;
