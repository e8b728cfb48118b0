pub mod mock_sse;
