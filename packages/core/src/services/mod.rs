pub mod feed_client;

#[cfg(test)]
pub mod mock_feed;
