use pulsetab::engine::{Admission, FrameQueue};
use pulsetab::OverflowPolicy;

#[test]
fn test_drop_oldest_retains_latest_frames() {
    let queue = FrameQueue::new(3, OverflowPolicy::DropOldest);
    let admissions: Vec<Admission> = (0..6u8).map(|i| queue.push(vec![i])).collect();

    assert_eq!(&admissions[..3], &[Admission::Accepted; 3]);
    assert_eq!(&admissions[3..], &[Admission::DroppedOldest; 3]);

    let drained: Vec<Vec<u8>> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(drained, vec![vec![3], vec![4], vec![5]]);
}

#[test]
fn test_drop_incoming_retains_earliest_frames() {
    let queue = FrameQueue::new(3, OverflowPolicy::DropIncoming);
    for i in 0..6u8 {
        queue.push(vec![i]);
    }
    assert_eq!(queue.len(), 3);

    let drained: Vec<Vec<u8>> = std::iter::from_fn(|| queue.pop()).collect();
    assert_eq!(drained, vec![vec![0], vec![1], vec![2]]);
}

#[test]
fn test_queue_never_exceeds_capacity() {
    let queue = FrameQueue::new(8, OverflowPolicy::DropOldest);
    for i in 0..1000u32 {
        queue.push(i.to_le_bytes().to_vec());
        assert!(queue.len() <= queue.capacity());
    }
    assert_eq!(queue.clear(), 8);
}

#[test]
fn test_zero_capacity_rounds_up() {
    let queue = FrameQueue::new(0, OverflowPolicy::DropIncoming);
    assert_eq!(queue.capacity(), 1);
    assert_eq!(queue.push(vec![1]), Admission::Accepted);
    assert_eq!(queue.push(vec![2]), Admission::DroppedIncoming);
}

#[test]
fn test_producer_and_consumer_threads() {
    let queue = FrameQueue::new(4, OverflowPolicy::DropOldest);
    let producer = {
        let queue = queue.clone();
        std::thread::spawn(move || {
            (0..500u32)
                .filter(|i| queue.push(i.to_le_bytes().to_vec()).dropped_a_frame())
                .count()
        })
    };

    let mut last = None;
    let mut received = 0;
    while !producer.is_finished() || !queue.is_empty() {
        if let Some(frame) = queue.pop() {
            let value = u32::from_le_bytes(frame.try_into().unwrap());
            // Order is preserved even with evictions
            assert!(last.map_or(true, |prev| value > prev));
            last = Some(value);
            received += 1;
        }
    }
    let dropped = producer.join().unwrap();
    assert_eq!(received + dropped, 500);
}
